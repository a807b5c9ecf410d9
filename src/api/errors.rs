use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },
    #[error("network error calling {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    InvalidUpload(String),
    #[error("invalid client configuration: {0}")]
    Client(String),
}

impl ApiError {
    /// Whether the failure looks temporary. Used for messaging only; nothing
    /// is retried automatically.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network { .. } => true,
            ApiError::Http { status, .. } => *status == 429 || (500..600).contains(status),
            ApiError::Decode { .. }
            | ApiError::Io(_)
            | ApiError::InvalidUpload(_)
            | ApiError::Client(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short line suitable for a toast-style notice
    pub fn notice(&self) -> String {
        match self {
            ApiError::Http { status: 401, .. } => {
                "Not authorised: check api.token or INVOICE_REVIEW_TOKEN".to_string()
            }
            ApiError::Http { status: 404, .. } => "Invoice not found".to_string(),
            ApiError::InvalidUpload(msg) => msg.clone(),
            other if other.is_transient() => {
                format!("Invoice service unavailable, try again later ({other})")
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            endpoint: "/api/Invoice".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(http(503).is_transient());
        assert!(http(429).is_transient());
        assert!(!http(400).is_transient());
        assert!(!ApiError::InvalidUpload("nope".to_string()).is_transient());
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(http(404).notice(), "Invoice not found");
        assert!(http(502).notice().starts_with("Invoice service unavailable"));
        assert_eq!(
            ApiError::InvalidUpload("Please select a valid PDF file".to_string()).notice(),
            "Please select a valid PDF file"
        );
        assert_eq!(http(500).status(), Some(500));
    }
}
