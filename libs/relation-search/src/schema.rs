//! Model and relation metadata.
//!
//! The host application registers its models here: table, primary key,
//! morph class and named relations. Relation search only ever looks
//! relations up by name through this registry.

use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Relation kinds understood by relation search.
///
/// `None` for a local/owner key means "the owning model's primary key".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    HasOne {
        related: String,
        foreign_key: String,
        local_key: Option<String>,
    },
    HasMany {
        related: String,
        foreign_key: String,
        local_key: Option<String>,
    },
    BelongsTo {
        related: String,
        foreign_key: String,
        owner_key: Option<String>,
    },
    BelongsToMany {
        related: String,
        pivot_table: String,
        /// Pivot column pointing at the owning model.
        foreign_pivot_key: String,
        /// Pivot column pointing at the related model.
        related_pivot_key: String,
        parent_key: Option<String>,
        related_key: Option<String>,
    },
    MorphOne {
        related: String,
        type_column: String,
        id_column: String,
        local_key: Option<String>,
    },
    MorphMany {
        related: String,
        type_column: String,
        id_column: String,
        local_key: Option<String>,
    },
    /// Inverse polymorphic relation: the related model varies per row and is
    /// named by `type_column` on the owning table.
    MorphTo {
        type_column: String,
        id_column: String,
        owner_key: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub name: String,
    pub kind: RelationKind,
}

impl RelationDef {
    pub fn is_polymorphic(&self) -> bool {
        matches!(self.kind, RelationKind::MorphTo { .. })
    }

    /// Related model name, `None` for polymorphic relations.
    pub fn related(&self) -> Option<&str> {
        match &self.kind {
            RelationKind::HasOne { related, .. }
            | RelationKind::HasMany { related, .. }
            | RelationKind::BelongsTo { related, .. }
            | RelationKind::BelongsToMany { related, .. }
            | RelationKind::MorphOne { related, .. }
            | RelationKind::MorphMany { related, .. } => Some(related),
            RelationKind::MorphTo { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    pub name: String,
    pub table: String,
    pub key: String,
    /// Value stored in morph type columns for this model.
    pub morph_class: String,
    relations: Vec<RelationDef>,
}

impl ModelDef {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            morph_class: name.clone(),
            name,
            table: table.into(),
            key: "id".to_string(),
            relations: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_morph_class(mut self, morph_class: impl Into<String>) -> Self {
        self.morph_class = morph_class.into();
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, kind: RelationKind) -> Self {
        let name = name.into();
        self.relations.retain(|r| r.name != name);
        self.relations.push(RelationDef { name, kind });
        self
    }

    pub fn has_one(self, name: &str, related: &str, foreign_key: &str) -> Self {
        self.with_relation(
            name,
            RelationKind::HasOne {
                related: related.to_string(),
                foreign_key: foreign_key.to_string(),
                local_key: None,
            },
        )
    }

    pub fn has_many(self, name: &str, related: &str, foreign_key: &str) -> Self {
        self.with_relation(
            name,
            RelationKind::HasMany {
                related: related.to_string(),
                foreign_key: foreign_key.to_string(),
                local_key: None,
            },
        )
    }

    pub fn belongs_to(self, name: &str, related: &str, foreign_key: &str) -> Self {
        self.with_relation(
            name,
            RelationKind::BelongsTo {
                related: related.to_string(),
                foreign_key: foreign_key.to_string(),
                owner_key: None,
            },
        )
    }

    pub fn belongs_to_many(
        self,
        name: &str,
        related: &str,
        pivot_table: &str,
        foreign_pivot_key: &str,
        related_pivot_key: &str,
    ) -> Self {
        self.with_relation(
            name,
            RelationKind::BelongsToMany {
                related: related.to_string(),
                pivot_table: pivot_table.to_string(),
                foreign_pivot_key: foreign_pivot_key.to_string(),
                related_pivot_key: related_pivot_key.to_string(),
                parent_key: None,
                related_key: None,
            },
        )
    }

    /// `morph_name` follows the `{name}_type` / `{name}_id` column convention.
    pub fn morph_many(self, name: &str, related: &str, morph_name: &str) -> Self {
        self.with_relation(
            name,
            RelationKind::MorphMany {
                related: related.to_string(),
                type_column: format!("{}_type", morph_name),
                id_column: format!("{}_id", morph_name),
                local_key: None,
            },
        )
    }

    pub fn morph_one(self, name: &str, related: &str, morph_name: &str) -> Self {
        self.with_relation(
            name,
            RelationKind::MorphOne {
                related: related.to_string(),
                type_column: format!("{}_type", morph_name),
                id_column: format!("{}_id", morph_name),
                local_key: None,
            },
        )
    }

    pub fn morph_to(self, name: &str, morph_name: &str) -> Self {
        self.with_relation(
            name,
            RelationKind::MorphTo {
                type_column: format!("{}_type", morph_name),
                id_column: format!("{}_id", morph_name),
                owner_key: None,
            },
        )
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }
}

/// Registry of every model relation search may traverse.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: HashMap<String, ModelDef>,
    /// Morph class -> names of the models declaring it.
    morph_classes: BTreeMap<String, BTreeSet<String>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: ModelDef) -> Self {
        self.insert(model);
        self
    }

    /// Register `model`, replacing any model of the same name.
    pub fn insert(&mut self, model: ModelDef) {
        if let Some(previous) = self.models.get(&model.name) {
            let previous_class = previous.morph_class.clone();
            if let Some(names) = self.morph_classes.get_mut(&previous_class) {
                names.remove(&model.name);
                if names.is_empty() {
                    self.morph_classes.remove(&previous_class);
                }
            }
        }
        self.morph_classes
            .entry(model.morph_class.clone())
            .or_default()
            .insert(model.name.clone());
        self.models.insert(model.name.clone(), model);
    }

    pub fn model(&self, name: &str) -> Result<&ModelDef> {
        self.models
            .get(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    /// Model stored under `morph_class` in morph type columns.
    ///
    /// Fails when more than one registered model declares the class.
    pub fn model_by_morph_class(&self, morph_class: &str) -> Result<Option<&ModelDef>> {
        let Some(names) = self.morph_classes.get(morph_class) else {
            return Ok(None);
        };
        if names.len() > 1 {
            return Err(Error::AmbiguousMorphClass {
                morph_class: morph_class.to_string(),
                models: names.iter().cloned().collect(),
            });
        }
        Ok(names.iter().next().and_then(|name| self.models.get(name)))
    }

    /// Look up `relation` on `model`, failing with a configuration error that
    /// names both.
    pub fn relation<'a>(&'a self, model: &'a ModelDef, relation: &str) -> Result<&'a RelationDef> {
        model.relation(relation).ok_or_else(|| Error::UnknownRelation {
            resource: model.name.clone(),
            relation: relation.to_string(),
        })
    }

    /// Related model of a non-polymorphic relation.
    pub fn related_model(&self, relation: &RelationDef) -> Result<&ModelDef> {
        match relation.related() {
            Some(related) => self.model(related),
            None => Err(Error::UnknownModel(format!(
                "relation '{}' is polymorphic and has no fixed related model",
                relation.name
            ))),
        }
    }
}
