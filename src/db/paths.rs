// src/db/paths.rs
//! Centralized path derivation for snapshot files

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Extension given to every published snapshot
pub const SNAPSHOT_EXTENSION: &str = "sqlite";

/// Reject version names that cannot be used as a single file name
pub fn validate_version_name(version: &str) -> Result<()> {
    if version.is_empty() || version.contains('/') || version.starts_with('.') {
        return Err(Error::ParseError(format!(
            "Invalid repository version name: {version:?}"
        )));
    }
    Ok(())
}

/// Get the published snapshot path for a version
pub fn snapshot_path(dir: &Path, version: &str) -> PathBuf {
    dir.join(format!("{version}.{SNAPSHOT_EXTENSION}"))
}

/// Prefix for the staging file a snapshot is built in
pub fn staging_prefix(version: &str) -> String {
    format!(".{version}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_path() {
        assert_eq!(
            snapshot_path(Path::new("/srv/vitrine"), "v3.12"),
            PathBuf::from("/srv/vitrine/v3.12.sqlite")
        );
    }

    #[test]
    fn test_version_names() {
        assert!(validate_version_name("edge").is_ok());
        assert!(validate_version_name("v3.12").is_ok());
        assert!(validate_version_name("").is_err());
        assert!(validate_version_name("../etc").is_err());
        assert!(validate_version_name("v3.12/main").is_err());
    }
}
