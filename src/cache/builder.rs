//! The builder seam: a pure function from `(resource name, parameters)`
//! to the resource's value, given a fixed store snapshot.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ResourceName;

use super::CacheError;

/// Ordered parameter mapping passed verbatim from registration to the
/// builder. Order matters because parameters are part of the resource's
/// identity as far as the builder is concerned.
pub type BuilderParams = Vec<(String, Value)>;

pub fn param<'a>(params: &'a BuilderParams, key: &str) -> Option<&'a Value> {
    params
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value)
}

/// Resolve the package scope a builder should query under: an explicit
/// `packageID` parameter wins, otherwise the scope suffix of the resource
/// name. Absence of both fails loudly.
pub fn resolve_scope(resource: &ResourceName, params: &BuilderParams) -> Result<i64, CacheError> {
    if let Some(value) = param(params, "packageID") {
        if let Some(id) = value.as_i64() {
            return Ok(id);
        }
    }
    Ok(resource.require_scope()?)
}

/// Builds a resource's value from scratch.
///
/// Implementations must be stateless and idempotent: all output is
/// returned, never cached by the builder itself, and no process state is
/// mutated. Memoization is the cache source's responsibility.
#[async_trait]
pub trait ResourceBuilder: Send + Sync {
    async fn build(
        &self,
        resource: &ResourceName,
        params: &BuilderParams,
    ) -> Result<Value, CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_package_parameter_wins_over_name_scope() {
        let resource = ResourceName::parse("routes-7").unwrap();
        let params: BuilderParams = vec![("packageID".to_string(), serde_json::json!(3))];
        assert_eq!(resolve_scope(&resource, &params).unwrap(), 3);
    }

    #[test]
    fn scope_falls_back_to_resource_name() {
        let resource = ResourceName::parse("routes-7").unwrap();
        assert_eq!(resolve_scope(&resource, &Vec::new()).unwrap(), 7);
    }

    #[test]
    fn missing_scope_fails_loudly() {
        let resource = ResourceName::parse("routes").unwrap();
        assert!(resolve_scope(&resource, &Vec::new()).is_err());
    }
}
