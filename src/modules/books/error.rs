use folio_backend::BackendError;
use thiserror::Error;

/// Failures from catalog writes. Reads never fail.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("backend is not configured")]
    NotConfigured,

    #[error("{operation} is not supported in offline mode")]
    UnsupportedOffline { operation: &'static str },

    #[error("could not read {uri}: {source}")]
    Source {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CatalogError {
    /// Message suitable for an alert shown to the person who attempted the write.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::NotConfigured => {
                "No backend is configured, so this change cannot be saved.".to_string()
            }
            CatalogError::UnsupportedOffline { operation } => {
                format!("Cannot {operation} while offline. Connect a backend and try again.")
            }
            CatalogError::Source { uri, .. } => {
                format!("Could not read {uri}. Check the file and try again.")
            }
            CatalogError::Backend(BackendError::Http { status, message })
                if *status == 401 || *status == 403 =>
            {
                format!("Permission denied: {message}")
            }
            CatalogError::Backend(err) => err.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_errors_are_explained() {
        let err = CatalogError::from(BackendError::Http {
            status: 403,
            message: "new row violates row-level security policy".to_string(),
        });
        assert_eq!(
            err.user_message(),
            "Permission denied: new row violates row-level security policy"
        );
    }

    #[test]
    fn offline_delete_message() {
        let err = CatalogError::UnsupportedOffline {
            operation: "delete",
        };
        assert_eq!(err.to_string(), "delete is not supported in offline mode");
    }
}
