use crate::dashboard::Capability;
use crate::model::Role;
use serde_json::json;
use thiserror::Error;

/// Failures a capability can report back to the form layer. None of them are fatal.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{0}")]
    Validation(String),

    #[error("{username:?} is not registered as {role}")]
    InvalidCredentials { role: Role, username: String },

    #[error("{role} may not {action}")]
    ForbiddenCapability { role: Role, action: String },

    #[error("log in first")]
    NotLoggedIn,

    #[error("select a workspace first")]
    NoWorkspace,

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        PortalError::Validation(message.into())
    }

    pub fn forbidden(role: Role, capability: Capability) -> Self {
        PortalError::ForbiddenCapability {
            role,
            action: capability.name().to_string(),
        }
    }

    /// Stable wire code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            PortalError::Validation(_) => "bad_params",
            PortalError::InvalidCredentials { .. } => "invalid_credentials",
            PortalError::ForbiddenCapability { .. } => "forbidden_capability",
            PortalError::NotLoggedIn => "not_logged_in",
            PortalError::NoWorkspace => "no_workspace",
            PortalError::Db(_) => "db_query_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            PortalError::InvalidCredentials { role, username } => {
                Some(json!({ "role": role, "username": username }))
            }
            PortalError::ForbiddenCapability { role, action } => {
                Some(json!({ "role": role, "action": action }))
            }
            _ => None,
        }
    }
}

pub type PortalResult<T> = Result<T, PortalError>;

/// Trimmed value of a required text field.
pub fn required(field: &str, value: &str) -> PortalResult<String> {
    let t = value.trim();
    if t.is_empty() {
        return Err(PortalError::validation(format!("{} must not be empty", field)));
    }
    Ok(t.to_string())
}
