use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::builder::{BuilderParams, ResourceBuilder};
use crate::cache::CacheError;
use crate::domain::tables::{ApplicationRecord, ApplicationTable};
use crate::domain::ResourceName;
use crate::infra::db::Store;

/// Builds the installed-application list, keyed by abbreviation.
/// Unscoped: applications are global to the installation.
pub struct ApplicationListBuilder {
    store: Arc<dyn Store>,
}

impl ApplicationListBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceBuilder for ApplicationListBuilder {
    async fn build(
        &self,
        resource: &ResourceName,
        _params: &BuilderParams,
    ) -> Result<Value, CacheError> {
        let rows = self.store.application_rows().await?;
        let table = ApplicationTable {
            applications: rows
                .into_iter()
                .map(|row| ApplicationRecord {
                    package_id: row.package_id,
                    abbreviation: row.abbreviation,
                    directory: row.directory,
                    is_primary: row.is_primary,
                })
                .collect(),
        };
        serde_json::to_value(&table).map_err(|err| CacheError::Serialize {
            resource: resource.to_string(),
            source: err,
        })
    }
}
