//! Per-invocation search context supplied by the host.

/// Where the search was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchContext {
    /// Search within a single resource listing.
    #[default]
    Scoped,
    /// Global search across every searchable resource.
    Global,
}

impl SearchContext {
    pub fn from_global_flag(is_global_search: bool) -> Self {
        if is_global_search {
            Self::Global
        } else {
            Self::Scoped
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}
