use thiserror::Error;

pub type Result<T> = std::result::Result<T, LeadSignalError>;

#[derive(Error, Debug)]
pub enum LeadSignalError {
    /// A credential or other required setting is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller's request is missing a required field.
    #[error("Invalid input: {0}")]
    Input(String),

    /// A collaborator call failed or produced nothing usable.
    #[error("Upstream error (status {}): {body}", .status.map_or_else(|| "n/a".to_string(), |s| s.to_string()))]
    Upstream { status: Option<u16>, body: String },

    /// A collaborator answered with something that is not the expected structure.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl LeadSignalError {
    pub fn upstream(status: Option<u16>, body: impl Into<String>) -> Self {
        LeadSignalError::Upstream {
            status,
            body: body.into(),
        }
    }
}

impl From<serde_json::Error> for LeadSignalError {
    fn from(err: serde_json::Error) -> Self {
        LeadSignalError::Parse(err.to_string())
    }
}
