use thiserror::Error;

/// kroute control plane errors
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Invalid match pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] kube::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Reasons an Ingress object is rejected at the watch boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngressParseError {
    #[error("Ingress has no metadata.name")]
    MissingName,

    #[error("Ingress {ingress}: path '{path}' has no service backend")]
    MissingServiceBackend { ingress: String, path: String },

    #[error("Ingress {ingress}: backend service '{service}' has no port")]
    MissingServicePort { ingress: String, service: String },

    #[error("Ingress {ingress}: unknown pathType '{path_type}'")]
    UnknownPathType { ingress: String, path_type: String },
}

impl IngressParseError {
    /// Metric label for this rejection
    pub fn reason(&self) -> &'static str {
        match self {
            IngressParseError::MissingName => "missing_name",
            IngressParseError::MissingServiceBackend { .. } => "missing_service_backend",
            IngressParseError::MissingServicePort { .. } => "missing_service_port",
            IngressParseError::UnknownPathType { .. } => "unknown_path_type",
        }
    }
}
