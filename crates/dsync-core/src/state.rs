use std::fmt;

/// Where a datastream's structured representation stands relative to its
/// last known bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CacheState {
    /// Nothing parsed yet.
    #[default]
    Unloaded,
    /// Parsed and consistent with the cached bytes.
    LoadedClean,
    /// Parsed and diverged from the cached bytes.
    LoadedDirty,
}

impl CacheState {
    pub fn is_loaded(&self) -> bool {
        !matches!(self, Self::Unloaded)
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => write!(f, "unloaded"),
            Self::LoadedClean => write!(f, "clean"),
            Self::LoadedDirty => write!(f, "dirty"),
        }
    }
}
