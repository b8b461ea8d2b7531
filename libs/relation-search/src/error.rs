//! Error types for relation search

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown relation '{relation}' on resource '{resource}'")]
    UnknownRelation { resource: String, relation: String },

    #[error("Invalid search descriptor for relation '{relation}' on resource '{resource}': {reason}")]
    InvalidDescriptor {
        resource: String,
        relation: String,
        reason: String,
    },

    #[error("Invalid search column '{column}' on resource '{resource}': {reason}")]
    InvalidSearchColumn {
        resource: String,
        column: String,
        reason: String,
    },

    #[error("Unknown custom search '{name}' for relation '{relation}' on resource '{resource}'")]
    UnknownCustomSearch {
        resource: String,
        relation: String,
        name: String,
    },

    #[error(
        "Morph type '{morph_type}' found for relation '{relation}' on resource '{resource}' does not map to a known model"
    )]
    UnknownMorphType {
        resource: String,
        relation: String,
        morph_type: String,
    },

    #[error("Morph class '{morph_class}' is declared by more than one model: {models:?}")]
    AmbiguousMorphClass {
        morph_class: String,
        models: Vec<String>,
    },

    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn invalid_descriptor(
        resource: &str,
        relation: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDescriptor {
            resource: resource.to_string(),
            relation: relation.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the declared search configuration rather
    /// than by the data layer.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownModel(_)
                | Self::UnknownRelation { .. }
                | Self::InvalidDescriptor { .. }
                | Self::InvalidSearchColumn { .. }
                | Self::UnknownCustomSearch { .. }
                | Self::AmbiguousMorphClass { .. }
                | Self::UnsupportedDriver(_)
                | Self::Config(_)
                | Self::Json(_)
        )
    }
}
