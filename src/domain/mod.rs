//! Domain layer: resource naming conventions and the table shapes that
//! cache consumers index into.

pub mod error;
pub mod tables;

pub use error::DomainError;
pub use tables::{
    ApplicationRecord, ApplicationTable, ControllerTypeEntry, ControllerTypeTable, LanguageRecord,
    LanguageTable, ListenerEntry, ListenerTable, PackageInstance, RouteTable, RouteTarget,
};

/// A cacheable resource identifier following the `<logicalName>-<scopeID>`
/// convention. The logical name is split off at the first `-`; everything
/// after it is the package or instance scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName {
    logical: String,
    scope: Option<i64>,
}

impl ResourceName {
    /// Parse a resource name that may or may not carry a scope suffix.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() {
            return Err(DomainError::malformed_resource_name(raw));
        }
        match raw.split_once('-') {
            Some((logical, scope)) => {
                if logical.is_empty() {
                    return Err(DomainError::malformed_resource_name(raw));
                }
                let scope = scope
                    .parse::<i64>()
                    .map_err(|_| DomainError::malformed_resource_name(raw))?;
                Ok(Self {
                    logical: logical.to_string(),
                    scope: Some(scope),
                })
            }
            None => Ok(Self {
                logical: raw.to_string(),
                scope: None,
            }),
        }
    }

    /// Parse a resource name whose convention requires a scope suffix.
    /// A missing separator is a programmer error and fails loudly.
    pub fn parse_scoped(raw: &str) -> Result<Self, DomainError> {
        let name = Self::parse(raw)?;
        if name.scope.is_none() {
            return Err(DomainError::malformed_resource_name(raw));
        }
        Ok(name)
    }

    pub fn logical(&self) -> &str {
        &self.logical
    }

    pub fn scope(&self) -> Option<i64> {
        self.scope
    }

    /// The scope this resource was registered under, or a loud failure
    /// when the convention requires one and the name does not carry it.
    pub fn require_scope(&self) -> Result<i64, DomainError> {
        self.scope
            .ok_or_else(|| DomainError::missing_scope(self.to_string()))
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scope {
            Some(scope) => write!(f, "{}-{}", self.logical, scope),
            None => f.write_str(&self.logical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scoped_name() {
        let name = ResourceName::parse("routes-42").unwrap();
        assert_eq!(name.logical(), "routes");
        assert_eq!(name.scope(), Some(42));
        assert_eq!(name.to_string(), "routes-42");
    }

    #[test]
    fn parses_unscoped_name() {
        let name = ResourceName::parse("applications").unwrap();
        assert_eq!(name.logical(), "applications");
        assert_eq!(name.scope(), None);
    }

    #[test]
    fn splits_on_first_separator_only() {
        // A non-numeric remainder after the first `-` violates the convention.
        assert!(ResourceName::parse("event-listeners-3").is_err());
    }

    #[test]
    fn scoped_parse_rejects_missing_scope() {
        assert!(ResourceName::parse_scoped("routes").is_err());
        assert!(ResourceName::parse_scoped("routes-").is_err());
        assert!(ResourceName::parse_scoped("-42").is_err());
        assert!(ResourceName::parse_scoped("").is_err());
    }
}
