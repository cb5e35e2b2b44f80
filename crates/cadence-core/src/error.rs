use thiserror::Error;

#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("not initialized: run 'cadence init'")]
    NotInitialized,

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template already exists: {0}")]
    DuplicateTemplate(String),

    #[error("invalid template '{id}': {reason}")]
    InvalidTemplate { id: String, reason: String },

    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    #[error("mode not found: {0}")]
    ModeNotFound(String),

    #[error("mode '{active}' is active: cannot start '{requested}' under strict exclusivity")]
    ModeActive { active: String, requested: String },

    #[error("mode failed: {0}")]
    ModeFailed(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("gate rejected transition into '{stage}'")]
    GateRejected { stage: String },

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CadenceError>;
