//! When to reuse the on-disk feature cache

/// What the corpus pass does with the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Return the cached bundle verbatim
    Load,
    /// Recompute every feature and persist the result
    Recompute,
}

/// Cache reuse strategy for a corpus pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Recompute on every pass
    AlwaysRecompute,
    /// Load the cache when present, compute it otherwise
    #[default]
    RecomputeIfMissing,
    /// Recompute now, replacing the existing artifact (the `update` flag)
    ForceRefresh,
}

impl CachePolicy {
    /// `update = true` forces a refresh; otherwise an existing cache is reused
    pub fn from_update_flag(update: bool) -> Self {
        if update {
            CachePolicy::ForceRefresh
        } else {
            CachePolicy::RecomputeIfMissing
        }
    }

    pub fn action(&self, cache_exists: bool) -> CacheAction {
        match self {
            CachePolicy::RecomputeIfMissing if cache_exists => CacheAction::Load,
            _ => CacheAction::Recompute,
        }
    }

    /// Figures can only be produced by a pass that recomputes features
    pub fn permits_visualizations(&self, cache_exists: bool) -> bool {
        self.action(cache_exists) == CacheAction::Recompute
    }
}
