// src/snapshot/graph.rs

//! Graph builder
//!
//! Turns the winning records into package, version and dependency rows.
//! Package ids assigned by the packages pass are needed by every later pass
//! and by the external linker, so they are returned as a [`PackageIds`].

use super::provider::ProviderMap;
use super::selector::NewestMap;
use crate::config::Repositories;
use crate::db::models::{DependencyEdge, MissingDependency, Package, VersionEntry};
use crate::error::{Error, Result};
use crate::version;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Name and start directory lookups over the inserted packages
#[derive(Debug, Clone, Default)]
pub struct PackageIds {
    ids: HashMap<String, i64>,
    /// Start directory of every main package, mapped to its name
    startdirs: BTreeMap<String, String>,
    mains: usize,
}

impl PackageIds {
    /// Id of the package called `name`
    pub fn id(&self, name: &str) -> Option<i64> {
        self.ids.get(name).copied()
    }

    /// Main package built from `startdir`
    pub fn main_for_startdir(&self, startdir: &str) -> Option<&str> {
        self.startdirs.get(startdir).map(String::as_str)
    }

    /// Record a package id; `startdir` is given for main packages only
    pub fn insert(&mut self, name: &str, id: i64, startdir: Option<&str>) {
        self.ids.insert(name.to_string(), id);
        if let Some(startdir) = startdir {
            self.startdirs.insert(startdir.to_string(), name.to_string());
            self.mains += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn main_count(&self) -> usize {
        self.mains
    }

    pub fn subpackage_count(&self) -> usize {
        self.ids.len() - self.mains
    }
}

/// Insert all global winners, main packages first
pub fn populate_packages(
    conn: &Connection,
    winners: &NewestMap,
    startdir_overrides: &BTreeMap<String, String>,
) -> Result<PackageIds> {
    info!("Building main package entries...");

    // Overrides map start directory -> package; the first path listed for a
    // package wins, everything else builds from <repo>/<name>
    let mut overrides_by_name: HashMap<&str, &str> = HashMap::new();
    for (path, name) in startdir_overrides {
        overrides_by_name.entry(name.as_str()).or_insert(path.as_str());
    }

    let mut ids = PackageIds::default();
    let mut main_startdirs: HashMap<&str, (i64, String)> = HashMap::new();

    for record in winners.values().filter(|r| r.is_main()) {
        let startdir = match overrides_by_name.get(record.name.as_str()) {
            Some(path) => path.to_string(),
            None => format!("{}/{}", record.repo, record.name),
        };
        let id = Package::from_record(record, &startdir, None).insert(conn)?;
        ids.insert(&record.name, id, Some(startdir.as_str()));
        main_startdirs.insert(record.name.as_str(), (id, startdir));
    }

    info!("Building subpackage entries...");
    for record in winners.values().filter(|r| !r.is_main()) {
        let (origin_id, startdir) = main_startdirs.get(record.origin.as_str()).ok_or_else(|| {
            Error::DanglingOriginError {
                package: record.name.clone(),
                origin: record.origin.clone(),
            }
        })?;

        let id = Package::from_record(record, startdir, Some(*origin_id)).insert(conn)?;
        ids.insert(&record.name, id, None);
    }

    debug!(
        "Inserted {} main packages and {} sub-packages",
        ids.main_count(),
        ids.subpackage_count()
    );
    Ok(ids)
}

/// Distinct versions, newest first
pub fn distinct_descending<'a, I>(versions: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut distinct: Vec<&str> = versions
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    distinct.sort_by(|a, b| version::cmp_versions(b, a));
    distinct
}

/// Set `rank` on every row with a version, rows grouped by logical package
pub fn assign_ranks(rows: &mut [VersionEntry]) {
    let ranks: HashMap<String, i64> =
        distinct_descending(rows.iter().filter_map(|row| row.version.as_deref()))
            .into_iter()
            .enumerate()
            .map(|(rank, version)| (version.to_string(), rank as i64))
            .collect();

    for row in rows.iter_mut() {
        row.rank = row
            .version
            .as_deref()
            .and_then(|version| ranks.get(version).copied());
    }
}

/// Build the version rows, including placeholders and ranks, without writing them
pub fn plan_versions(
    winners: &NewestMap,
    per_arch: &BTreeMap<String, NewestMap>,
    repos: &Repositories,
    ids: &PackageIds,
) -> Result<Vec<VersionEntry>> {
    let lookup = |name: &str| {
        ids.id(name)
            .ok_or_else(|| Error::NotFoundError(format!("No package id for {name}")))
    };

    // Ranks are shared by a main package and its sub-packages
    let mut by_origin: BTreeMap<&str, Vec<VersionEntry>> = BTreeMap::new();

    for packages in per_arch.values() {
        for record in packages.values() {
            by_origin
                .entry(record.origin.as_str())
                .or_default()
                .push(VersionEntry::observed(lookup(&record.name)?, record));
        }
    }

    for record in winners.values().filter(|r| r.is_main()) {
        let Some(arches) = repos.get(&record.repo) else {
            continue;
        };
        for arch in arches {
            let built = per_arch
                .get(arch)
                .is_some_and(|packages| packages.contains(&record.name));
            if !built {
                by_origin
                    .entry(record.origin.as_str())
                    .or_default()
                    .push(VersionEntry::placeholder(lookup(&record.name)?, arch));
            }
        }
    }

    let mut rows = Vec::new();
    for (_, mut group) in by_origin {
        assign_ranks(&mut group);
        rows.extend(group);
    }
    Ok(rows)
}

/// Insert one version row per (package, architecture)
pub fn populate_versions(
    conn: &Connection,
    winners: &NewestMap,
    per_arch: &BTreeMap<String, NewestMap>,
    repos: &Repositories,
    ids: &PackageIds,
) -> Result<usize> {
    info!("Building version table...");

    let mut rows = plan_versions(winners, per_arch, repos, ids)?;
    for row in &mut rows {
        row.insert(conn)?;
    }
    Ok(rows.len())
}

/// Dependency rows derived from every architecture's winners
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDependencies {
    pub common: BTreeSet<DependencyEdge>,
    pub arch_specific: BTreeSet<DependencyEdge>,
    pub missing: Vec<MissingDependency>,
    /// Negated specs with no provider
    pub dropped: usize,
}

/// Resolve every declared dependency and split the results into common and
/// architecture-specific edges
///
/// An edge is common when the dependent resolves it on every architecture
/// that builds the dependent.
pub fn resolve_dependencies(
    per_arch: &BTreeMap<String, NewestMap>,
    providers: &ProviderMap,
    ids: &PackageIds,
) -> ResolvedDependencies {
    let mut result = ResolvedDependencies::default();
    // dependent id -> arch -> dependency ids
    let mut resolved: BTreeMap<i64, BTreeMap<&str, BTreeSet<i64>>> = BTreeMap::new();

    for (arch, packages) in per_arch {
        for (name, record) in packages.iter() {
            let Some(dependent) = ids.id(name) else {
                warn!("{}/{} has no package ID", arch, name);
                continue;
            };

            let deps = resolved
                .entry(dependent)
                .or_default()
                .entry(arch.as_str())
                .or_default();

            for spec in &record.depends {
                let Some(provider) = providers.resolve(spec) else {
                    if spec.starts_with('!') {
                        result.dropped += 1;
                        continue;
                    }
                    warn!("{}/{} depends on unknown {:?}", arch, name, spec);
                    result
                        .missing
                        .push(MissingDependency::new(dependent, arch, spec));
                    continue;
                };

                match ids.id(&provider.name) {
                    Some(dependency) => {
                        deps.insert(dependency);
                    }
                    None => warn!("{}/{} depends on {:?} with no ID", arch, name, spec),
                }
            }
        }
    }

    for (dependent, arches) in &resolved {
        let mut sets = arches.values();
        let common: BTreeSet<i64> = match sets.next() {
            Some(first) => sets.fold(first.clone(), |acc, set| &acc & set),
            None => BTreeSet::new(),
        };

        for dependency in &common {
            result
                .common
                .insert(DependencyEdge::common(*dependent, *dependency));
        }
        for (arch, set) in arches {
            for dependency in set.difference(&common) {
                result
                    .arch_specific
                    .insert(DependencyEdge::arch_specific(arch, *dependent, *dependency));
            }
        }
    }

    result
}

/// Counts written by [`populate_dependencies`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyCounts {
    pub common: usize,
    pub arch_specific: usize,
    pub missing: usize,
}

/// Resolve and insert dependency, architecture dependency and missing rows
pub fn populate_dependencies(
    conn: &Connection,
    per_arch: &BTreeMap<String, NewestMap>,
    providers: &ProviderMap,
    ids: &PackageIds,
) -> Result<DependencyCounts> {
    info!("Building dependency tables...");

    let resolved = resolve_dependencies(per_arch, providers, ids);
    for edge in resolved.common.iter().chain(&resolved.arch_specific) {
        edge.insert(conn)?;
    }
    for missing in &resolved.missing {
        missing.insert(conn)?;
    }
    if resolved.dropped > 0 {
        debug!("Dropped {} unresolved negated dependencies", resolved.dropped);
    }

    Ok(DependencyCounts {
        common: resolved.common.len(),
        arch_specific: resolved.arch_specific.len(),
        missing: resolved.missing.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::repository::PackageRecord;
    use std::rc::Rc;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        schema::create_schema(&conn).unwrap();
        conn
    }

    fn winners(records: Vec<PackageRecord>) -> NewestMap {
        let mut map = NewestMap::new();
        for record in records {
            map.offer(&Rc::new(record));
        }
        map
    }

    fn row(version: Option<&str>) -> VersionEntry {
        let mut row = VersionEntry::placeholder(1, "x86_64");
        row.version = version.map(str::to_string);
        row
    }

    #[test]
    fn test_rank_collapses_duplicate_versions() {
        let mut rows = vec![
            row(Some("2.0")),
            row(Some("1.5")),
            row(Some("1.5")),
            row(Some("1.0")),
            row(None),
        ];
        assign_ranks(&mut rows);

        let ranks: Vec<_> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![Some(0), Some(1), Some(1), Some(2), None]);
    }

    #[test]
    fn test_distinct_descending_uses_version_order() {
        assert_eq!(
            distinct_descending(["1.10", "1.9", "1.10", "1.9_rc1"]),
            vec!["1.10", "1.9", "1.9_rc1"]
        );
    }

    #[test]
    fn test_populate_packages_links_subpackages() {
        let conn = test_conn();
        let map = winners(vec![
            PackageRecord::new("main", "x86_64", "foo-doc", "1.0").with_origin("foo"),
            PackageRecord::new("main", "x86_64", "foo", "1.0"),
            PackageRecord::new("community", "x86_64", "py3-bar", "2.0"),
        ]);
        let mut overrides = BTreeMap::new();
        overrides.insert("community/bar".to_string(), "py3-bar".to_string());

        let ids = populate_packages(&conn, &map, &overrides).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.main_count(), 2);
        assert_eq!(ids.subpackage_count(), 1);
        assert_eq!(ids.main_for_startdir("main/foo"), Some("foo"));
        assert_eq!(ids.main_for_startdir("community/bar"), Some("py3-bar"));
        assert_eq!(ids.main_for_startdir("community/py3-bar"), None);

        let doc = Package::find_by_name(&conn, "foo-doc").unwrap().unwrap();
        assert_eq!(doc.origin, ids.id("foo"));
        assert_eq!(doc.startdir, "main/foo");
    }

    #[test]
    fn test_populate_packages_dangling_origin() {
        let conn = test_conn();
        let map = winners(vec![
            PackageRecord::new("main", "x86_64", "foo-doc", "1.0").with_origin("foo"),
        ]);

        let err = populate_packages(&conn, &map, &BTreeMap::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::DanglingOriginError { ref package, ref origin }
                if package == "foo-doc" && origin == "foo"
        ));
    }

    #[test]
    fn test_plan_versions_placeholders_and_ranks() {
        let x86 = Rc::new(PackageRecord::new("main", "x86_64", "foo", "1.2-r0"));
        let arm = Rc::new(PackageRecord::new("main", "armv7", "foo", "1.1-r0"));

        let mut global = NewestMap::new();
        global.offer(&x86);
        global.offer(&arm);

        let mut per_arch = BTreeMap::new();
        per_arch.entry("x86_64".to_string()).or_insert_with(NewestMap::new).offer(&x86);
        per_arch.entry("armv7".to_string()).or_insert_with(NewestMap::new).offer(&arm);

        let repos: Repositories = [(
            "main".to_string(),
            vec!["x86_64".to_string(), "aarch64".to_string(), "armv7".to_string()],
        )]
        .into_iter()
        .collect();

        let mut ids = PackageIds::default();
        ids.insert("foo", 1, Some("main/foo"));

        let rows = plan_versions(&global, &per_arch, &repos, &ids).unwrap();
        let mut summary: Vec<_> = rows
            .iter()
            .map(|r| (r.arch.as_str(), r.version.as_deref(), r.rank))
            .collect();
        summary.sort();
        assert_eq!(
            summary,
            vec![
                ("aarch64", None, None),
                ("armv7", Some("1.1-r0"), Some(1)),
                ("x86_64", Some("1.2-r0"), Some(0)),
            ]
        );
    }

    fn arch_map(records: &[&Rc<PackageRecord>]) -> NewestMap {
        let mut map = NewestMap::new();
        for record in records {
            map.offer(record);
        }
        map
    }

    #[test]
    fn test_dependencies_split_by_architecture() {
        // foo depends on bar everywhere, on baz only on x86_64
        let bar = Rc::new(PackageRecord::new("main", "x86_64", "bar", "1.0"));
        let baz = Rc::new(
            PackageRecord::new("main", "x86_64", "baz", "1.0").with_provides(["so:libbaz.so.1"]),
        );
        let foo_x86 = Rc::new(
            PackageRecord::new("main", "x86_64", "foo", "1.0")
                .with_depends(["bar>=1.0", "so:libbaz.so.1", "!foo-legacy", "so:libgone.so.2"]),
        );
        let foo_arm = Rc::new(
            PackageRecord::new("main", "aarch64", "foo", "1.0").with_depends(["bar"]),
        );

        let mut per_arch = BTreeMap::new();
        per_arch.insert("x86_64".to_string(), arch_map(&[&bar, &baz, &foo_x86]));
        per_arch.insert("aarch64".to_string(), arch_map(&[&bar, &foo_arm]));

        let mut providers = ProviderMap::new();
        for record in [&bar, &baz, &foo_x86] {
            providers.register(record);
        }

        let mut ids = PackageIds::default();
        ids.insert("foo", 1, Some("main/foo"));
        ids.insert("bar", 2, Some("main/bar"));
        ids.insert("baz", 3, Some("main/baz"));

        let resolved = resolve_dependencies(&per_arch, &providers, &ids);
        assert_eq!(
            resolved.common.into_iter().collect::<Vec<_>>(),
            vec![DependencyEdge::common(1, 2)]
        );
        assert_eq!(
            resolved.arch_specific.into_iter().collect::<Vec<_>>(),
            vec![DependencyEdge::arch_specific("x86_64", 1, 3)]
        );
        assert_eq!(
            resolved.missing,
            vec![MissingDependency::new(1, "x86_64", "so:libgone.so.2")]
        );
        assert_eq!(resolved.dropped, 1);
    }

    #[test]
    fn test_common_is_intersection_over_all_arches() {
        let dep_a = Rc::new(PackageRecord::new("main", "x86_64", "a", "1.0"));
        let dep_b = Rc::new(PackageRecord::new("main", "x86_64", "b", "1.0"));
        let on = |arch: &str, deps: &[&str]| {
            Rc::new(PackageRecord::new("main", arch, "foo", "1.0").with_depends(deps.iter().copied()))
        };

        let mut per_arch = BTreeMap::new();
        per_arch.insert("x86_64".to_string(), arch_map(&[&dep_a, &dep_b, &on("x86_64", &["a", "b"])]));
        per_arch.insert("aarch64".to_string(), arch_map(&[&dep_a, &dep_b, &on("aarch64", &["a", "b"])]));
        per_arch.insert("armv7".to_string(), arch_map(&[&dep_a, &on("armv7", &["a"])]));

        let mut providers = ProviderMap::new();
        providers.register(&dep_a);
        providers.register(&dep_b);

        let mut ids = PackageIds::default();
        ids.insert("foo", 1, Some("main/foo"));
        ids.insert("a", 2, Some("main/a"));
        ids.insert("b", 3, Some("main/b"));

        let resolved = resolve_dependencies(&per_arch, &providers, &ids);
        assert_eq!(
            resolved.common.into_iter().collect::<Vec<_>>(),
            vec![DependencyEdge::common(1, 2)]
        );
        assert_eq!(
            resolved.arch_specific.into_iter().collect::<Vec<_>>(),
            vec![
                DependencyEdge::arch_specific("aarch64", 1, 3),
                DependencyEdge::arch_specific("x86_64", 1, 3),
            ]
        );
    }
}
