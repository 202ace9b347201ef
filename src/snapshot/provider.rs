// src/snapshot/provider.rs

//! Provider resolution
//!
//! Maps every name a package can satisfy (its own name and each provides
//! alias with the version constraint stripped) to the best package claiming
//! it. There is no provider priority: the newest-selection rule alone picks
//! between packages providing the same alias.

use super::selector::{NewestMap, SharedRecord};
use crate::version::dependency_name;

/// Alias to providing package
#[derive(Debug, Clone, Default)]
pub struct ProviderMap {
    providers: NewestMap,
}

impl ProviderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package under its name and every provides alias
    pub fn register(&mut self, record: &SharedRecord) {
        self.providers.offer(record);
        for alias in &record.provides {
            self.providers.offer_as(dependency_name(alias), record);
        }
    }

    /// Provider for a dependency spec such as `so:libc.musl-x86_64.so.1` or `foo>=1.2`
    pub fn resolve(&self, spec: &str) -> Option<&SharedRecord> {
        self.providers.get(dependency_name(spec))
    }
}
