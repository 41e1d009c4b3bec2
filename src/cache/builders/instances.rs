use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::builder::{BuilderParams, ResourceBuilder, resolve_scope};
use crate::cache::CacheError;
use crate::domain::tables::PackageInstance;
use crate::domain::ResourceName;
use crate::infra::db::Store;

/// Builds the package-instance record for a scope.
pub struct PackageInstanceBuilder {
    store: Arc<dyn Store>,
}

impl PackageInstanceBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceBuilder for PackageInstanceBuilder {
    async fn build(
        &self,
        resource: &ResourceName,
        params: &BuilderParams,
    ) -> Result<Value, CacheError> {
        let scope = resolve_scope(resource, params)?;
        let row = self.store.package_instance(scope).await?;
        let instance = PackageInstance {
            package_id: row.package_id,
            identifier: row.identifier,
            directory: row.directory,
        };
        serde_json::to_value(&instance).map_err(|err| CacheError::Serialize {
            resource: resource.to_string(),
            source: err,
        })
    }
}
