// src/snapshot/selector.rs

//! Newest-build selection
//!
//! When the same name is seen more than once (several repositories, several
//! architectures, or a provides alias claimed by several packages) a new
//! record replaces the held one when the held version is older, or failing
//! that when the held build time is earlier. Otherwise the held record stays.

use crate::repository::PackageRecord;
use crate::version;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::rc::Rc;
use tracing::debug;

/// A record shared between the global, per-architecture and provider maps
pub type SharedRecord = Rc<PackageRecord>;

/// True when `candidate` should replace `existing`
pub fn prefers_candidate(existing: &PackageRecord, candidate: &PackageRecord) -> bool {
    version::is_older(&existing.version, &candidate.version)
        || existing.build_time < candidate.build_time
}

/// Pick the winner between the record currently held (if any) and a new one
pub fn select<'a>(
    existing: Option<&'a PackageRecord>,
    candidate: &'a PackageRecord,
) -> &'a PackageRecord {
    match existing {
        Some(existing) if !prefers_candidate(existing, candidate) => existing,
        _ => candidate,
    }
}

/// Name to newest record
#[derive(Debug, Clone, Default)]
pub struct NewestMap {
    entries: BTreeMap<String, SharedRecord>,
}

impl NewestMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a record under its own name; returns true if it now holds the key
    pub fn offer(&mut self, record: &SharedRecord) -> bool {
        self.offer_as(&record.name, record)
    }

    /// Offer a record under an arbitrary key
    pub fn offer_as(&mut self, key: &str, record: &SharedRecord) -> bool {
        match self.entries.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(Rc::clone(record));
                true
            }
            Entry::Occupied(mut slot) => {
                if Rc::ptr_eq(slot.get(), record) {
                    return true;
                }
                if prefers_candidate(slot.get(), record) {
                    debug!(
                        "{}: {} {} replaces {} {}",
                        key,
                        record.name,
                        record.version,
                        slot.get().name,
                        slot.get().version
                    );
                    slot.insert(Rc::clone(record));
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&SharedRecord> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Winning records in key order
    pub fn values(&self) -> impl Iterator<Item = &SharedRecord> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(version: &str, build_time: i64) -> PackageRecord {
        PackageRecord::new("main", "x86_64", "foo", version).with_build_time(build_time)
    }

    #[test]
    fn test_no_existing_record() {
        let candidate = rec("1.0", 0);
        assert!(std::ptr::eq(select(None, &candidate), &candidate));
    }

    #[test]
    fn test_newer_version_wins() {
        let old = rec("1.0", 100);
        let new = rec("1.1", 100);
        assert!(std::ptr::eq(select(Some(&old), &new), &new));
        assert!(std::ptr::eq(select(Some(&new), &old), &new));
    }

    #[test]
    fn test_later_build_replaces_newer_version() {
        // Build time is checked whenever the held version is not older
        let held = rec("1.1", 100);
        let rebuilt = rec("1.0", 200);
        assert!(std::ptr::eq(select(Some(&held), &rebuilt), &rebuilt));
    }

    #[test]
    fn test_build_time_breaks_version_tie() {
        let early = rec("1.0", 100);
        let late = rec("1.0", 200);
        assert!(std::ptr::eq(select(Some(&early), &late), &late));
        assert!(std::ptr::eq(select(Some(&late), &early), &late));
    }

    #[test]
    fn test_full_tie_keeps_existing() {
        let a = rec("1.0", 100);
        let b = rec("1.0", 100);
        assert!(std::ptr::eq(select(Some(&a), &b), &a));
        assert!(std::ptr::eq(select(Some(&a), &a), &a));
    }

    #[test]
    fn test_map_keeps_newest() {
        let mut map = NewestMap::new();
        let old = Rc::new(rec("1.0", 100));
        let new = Rc::new(rec("1.2", 300));

        assert!(map.offer(&old));
        assert!(map.offer(&new));
        assert!(!map.offer(&old));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("foo").unwrap().version, "1.2");
    }

    #[test]
    fn test_offer_as_alias() {
        let mut map = NewestMap::new();
        let foo = Rc::new(rec("1.0", 0));
        map.offer_as("cmd:foo", &foo);
        assert!(map.contains("cmd:foo"));
        assert!(!map.contains("foo"));
    }
}
