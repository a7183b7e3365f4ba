use crate::models::{EditResult, ErrorKind};
use crate::services::providers::ProviderError;
use thiserror::Error;

/// Everything that can go wrong while serving `POST /api/edit`.
#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Uploaded file exceeds the maximum size of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl EditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditError::Provider(ProviderError::NotConfigured(_)) => ErrorKind::Configuration,
            EditError::Provider(ProviderError::Api { .. }) => ErrorKind::Provider,
            EditError::Provider(ProviderError::NoImageReturned)
            | EditError::Provider(ProviderError::MalformedResponse(_)) => ErrorKind::Schema,
            EditError::Provider(ProviderError::Network { .. }) => ErrorKind::Transport,
            EditError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            EditError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

impl From<EditError> for EditResult {
    fn from(err: EditError) -> Self {
        let kind = err.kind();
        match err {
            EditError::Provider(ProviderError::Api {
                status_code,
                code,
                message,
            }) => EditResult::provider_failure(status_code, code, message),
            other => EditResult::failure(kind, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_pass_code_and_message_through() {
        let result: EditResult = EditError::from(ProviderError::Api {
            status_code: 400,
            code: Some("InvalidParameter".to_string()),
            message: Some("bad image".to_string()),
        })
        .into();

        assert!(!result.success);
        assert_eq!(result.status_code, Some(400));
        assert_eq!(result.error_code.as_deref(), Some("InvalidParameter"));
        assert_eq!(result.error_message.as_deref(), Some("bad image"));
        assert_eq!(result.error, None);
        assert_eq!(result.error_kind, Some(ErrorKind::Provider));
    }

    #[test]
    fn empty_success_is_a_schema_failure() {
        let result: EditResult = EditError::from(ProviderError::NoImageReturned).into();

        assert_eq!(result.error_kind, Some(ErrorKind::Schema));
        assert_eq!(
            result.error.as_deref(),
            Some("call succeeded but no image returned")
        );
    }

    #[test]
    fn network_failures_are_transport() {
        let err = EditError::from(ProviderError::Network {
            provider: "DashScope",
            detail: "connection refused".to_string(),
        });

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.to_string(), "Failed to call DashScope: connection refused");
    }

    #[test]
    fn local_rejections_have_their_own_kinds() {
        assert_eq!(
            EditError::PayloadTooLarge { limit: 10 }.kind(),
            ErrorKind::PayloadTooLarge
        );
        assert_eq!(
            EditError::InvalidRequest("missing prompt".to_string()).kind(),
            ErrorKind::InvalidRequest
        );
    }
}
