use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("malformed resource name `{raw}`: expected `<logicalName>-<scopeID>`")]
    MalformedResourceName { raw: String },
    #[error("resource `{resource}` requires a package scope but none was supplied")]
    MissingScope { resource: String },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn malformed_resource_name(raw: impl Into<String>) -> Self {
        Self::MalformedResourceName { raw: raw.into() }
    }

    pub fn missing_scope(resource: impl Into<String>) -> Self {
        Self::MissingScope {
            resource: resource.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
