// src/error.rs

use thiserror::Error;

/// Failure kinds for one report invocation.
///
/// Every variant carries a `caller` tag identifying the failing stage and a
/// user-facing message that is distinct from the internal detail; the detail
/// only surfaces through logs, never through the response envelope.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{caller}: {detail}")]
    Validation {
        caller: &'static str,
        detail: String,
        msg: String,
    },

    #[error("{caller}: no records found")]
    NotFound { caller: &'static str },

    #[error("{caller}: {detail}")]
    Dependency {
        caller: &'static str,
        detail: String,
        msg: String,
    },

    #[error("{caller}: {detail}")]
    Render {
        caller: &'static str,
        detail: String,
    },
}

pub const NO_RECORDS_MSG: &str = "No records found matching criteria";

impl ReportError {
    pub fn validation(
        caller: &'static str,
        detail: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            caller,
            detail: detail.into(),
            msg: msg.into(),
        }
    }

    pub fn not_found(caller: &'static str) -> Self {
        Self::NotFound { caller }
    }

    pub fn dependency(
        caller: &'static str,
        detail: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Dependency {
            caller,
            detail: detail.into(),
            msg: msg.into(),
        }
    }

    /// Wraps a driver-level store error.
    pub fn store(caller: &'static str, err: mongodb::error::Error, msg: impl Into<String>) -> Self {
        Self::Dependency {
            caller,
            detail: err.to_string(),
            msg: msg.into(),
        }
    }

    pub fn render(caller: &'static str, detail: impl Into<String>) -> Self {
        Self::Render {
            caller,
            detail: detail.into(),
        }
    }

    pub fn caller(&self) -> &'static str {
        match self {
            Self::Validation { caller, .. }
            | Self::NotFound { caller }
            | Self::Dependency { caller, .. }
            | Self::Render { caller, .. } => caller,
        }
    }

    /// The message sent back to the client in the response envelope.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { msg, .. } | Self::Dependency { msg, .. } => msg.clone(),
            Self::NotFound { .. } => NO_RECORDS_MSG.to_string(),
            Self::Render { .. } => "Failed to create report document".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_differs_from_internal_detail() {
        let err = ReportError::dependency(
            "db.fetch_employee",
            "connection reset by peer",
            "Failed to fetch employee",
        );
        assert_eq!(err.user_message(), "Failed to fetch employee");
        assert_eq!(err.to_string(), "db.fetch_employee: connection reset by peer");
        assert_eq!(err.caller(), "db.fetch_employee");
    }

    #[test]
    fn not_found_uses_fixed_message() {
        let err = ReportError::not_found("db.fetch_day_aggregate");
        assert_eq!(err.user_message(), NO_RECORDS_MSG);
    }

    #[test]
    fn render_errors_hide_detail() {
        let err = ReportError::render("pdf.render", "missing builtin font");
        assert_eq!(err.user_message(), "Failed to create report document");
        assert!(err.to_string().contains("missing builtin font"));
    }
}
