//! Effective relation search configuration per invocation.

use crate::context::SearchContext;
use crate::descriptor::SearchConfig;

/// Picks the relation map that applies to a search invocation.
///
/// `global_relations` distinguishes "not configured" (`None`) from an
/// explicit empty override (`Some` of an empty config), which opts the
/// resource out of relation search in global mode.
#[derive(Debug, Clone)]
pub struct SearchConfigResolver {
    relations: SearchConfig,
    global_relations: Option<SearchConfig>,
    search_relations_globally: bool,
}

impl Default for SearchConfigResolver {
    fn default() -> Self {
        Self::new(None, None, true)
    }
}

impl SearchConfigResolver {
    pub fn new(
        relations: Option<SearchConfig>,
        global_relations: Option<SearchConfig>,
        search_relations_globally: bool,
    ) -> Self {
        Self {
            relations: relations.unwrap_or_default(),
            global_relations,
            search_relations_globally,
        }
    }

    pub fn set_relations(&mut self, relations: SearchConfig) {
        self.relations = relations;
    }

    pub fn set_global_relations(&mut self, global_relations: Option<SearchConfig>) {
        self.global_relations = global_relations;
    }

    pub fn set_search_relations_globally(&mut self, enabled: bool) {
        self.search_relations_globally = enabled;
    }

    /// Relation map declared for scoped searches.
    pub fn relations(&self) -> &SearchConfig {
        &self.relations
    }

    pub fn global_relations(&self) -> Option<&SearchConfig> {
        self.global_relations.as_ref()
    }

    pub fn search_relations_globally(&self) -> bool {
        self.search_relations_globally
    }

    pub fn resolve(&self, context: SearchContext) -> &SearchConfig {
        if !context.is_global() {
            return &self.relations;
        }
        if let Some(global) = &self.global_relations {
            return global;
        }
        if !self.search_relations_globally {
            return SearchConfig::empty();
        }
        &self.relations
    }
}
