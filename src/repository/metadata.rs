// src/repository/metadata.rs

//! Package records read from an APK repository index

/// One package entry from one (repository, architecture) index
///
/// `origin` is always set: it equals `name` for a main package and names the
/// main package otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub repo: String,
    pub arch: String,
    pub name: String,
    pub origin: String,
    pub version: String,
    /// Build time as a Unix timestamp
    pub build_time: i64,
    pub size: Option<i64>,
    /// Source control revision the package was built from
    pub revision: Option<String>,
    pub maintainer: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    /// Dependency specs as written in the index (`name[op version]`)
    pub depends: Vec<String>,
    /// Provides specs as written in the index
    pub provides: Vec<String>,
}

impl PackageRecord {
    /// Create a main package record with no metadata beyond its version
    pub fn new(repo: &str, arch: &str, name: &str, version: &str) -> Self {
        Self {
            repo: repo.to_string(),
            arch: arch.to_string(),
            name: name.to_string(),
            origin: name.to_string(),
            version: version.to_string(),
            build_time: 0,
            size: None,
            revision: None,
            maintainer: None,
            license: None,
            url: None,
            description: None,
            depends: Vec::new(),
            provides: Vec::new(),
        }
    }

    /// Whether this is the main package of its build (origin == name)
    pub fn is_main(&self) -> bool {
        self.origin == self.name
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    pub fn with_build_time(mut self, build_time: i64) -> Self {
        self.build_time = build_time;
        self
    }

    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_provides<I, S>(mut self, provides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides = provides.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_maintainer(mut self, maintainer: &str) -> Self {
        self.maintainer = Some(maintainer.to_string());
        self
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }
}
