use std::fmt;
use std::path::PathBuf;

/// Nesting levels below the source that are expanded by default.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Where the top-level archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Local(PathBuf),
    Remote(String),
}

impl ArchiveSource {
    /// `http://` and `https://` strings are remote, everything else is a path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            ArchiveSource::Remote(source.to_string())
        } else {
            ArchiveSource::Local(PathBuf::from(source))
        }
    }

    /// Path used in reports and for naming.
    pub fn display_path(&self) -> PathBuf {
        match self {
            ArchiveSource::Local(path) => path.clone(),
            ArchiveSource::Remote(url) => PathBuf::from(url),
        }
    }
}

impl fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveSource::Local(path) => write!(f, "{}", path.display()),
            ArchiveSource::Remote(url) => f.write_str(url),
        }
    }
}

/// Everything one expansion run needs.
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    pub source: ArchiveSource,
    pub destination: PathBuf,
    /// Deepest nesting level expanded; the source itself is level 0.
    pub max_depth: usize,
    /// Lowercase extensions, without the dot, that mark nested archives.
    pub extensions: Vec<String>,
}

impl ExpandOptions {
    pub fn new(source: ArchiveSource, destination: impl Into<PathBuf>) -> Self {
        Self {
            source,
            destination: destination.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            extensions: vec!["zip".to_string()],
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }
}
