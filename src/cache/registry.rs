//! Resource registry: the process-wide mapping from resource names to
//! their builder, artifact key and lifetime policy.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::domain::ResourceName;

use super::builder::{BuilderParams, ResourceBuilder};
use super::lock::{rw_read, rw_write};
use super::source::DiskCacheSource;
use super::CacheError;

const SOURCE: &str = "cache::registry";

/// Registration record for one resource. `min_lifetime` is carried but is
/// currently a no-op: the lifetime window only gates rebuilds through
/// `max_lifetime`, an artifact is never "too fresh to use".
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub resource_name: ResourceName,
    pub artifact_key: String,
    pub min_lifetime: u64,
    pub max_lifetime: u64,
    pub params: BuilderParams,
}

#[derive(Clone)]
struct RegisteredResource {
    entry: Arc<CacheEntry>,
    builder: Arc<dyn ResourceBuilder>,
}

#[derive(Default)]
struct RegistryState {
    resources: HashMap<String, RegisteredResource>,
    order: Vec<String>,
}

/// The resource registry. Owns the in-memory entry table for the process
/// lifetime; the table itself is never persisted, only artifacts are.
pub struct CacheRegistry {
    source: DiskCacheSource,
    state: RwLock<RegistryState>,
}

impl CacheRegistry {
    pub fn new(source: DiskCacheSource) -> Self {
        Self {
            source,
            state: RwLock::new(RegistryState::default()),
        }
    }

    pub fn source(&self) -> &DiskCacheSource {
        &self.source
    }

    /// Register a resource. Idempotent: a name that is already registered
    /// is left untouched, including its builder and parameters.
    pub fn create_resource(
        &self,
        resource_name: &str,
        artifact_key: &str,
        builder: Arc<dyn ResourceBuilder>,
        min_lifetime: u64,
        max_lifetime: u64,
        params: BuilderParams,
    ) -> Result<(), CacheError> {
        let parsed = ResourceName::parse(resource_name)?;
        let mut state = rw_write(&self.state, SOURCE, "create_resource");
        if state.resources.contains_key(resource_name) {
            debug!(resource = resource_name, "resource already registered");
            return Ok(());
        }
        state.resources.insert(
            resource_name.to_string(),
            RegisteredResource {
                entry: Arc::new(CacheEntry {
                    resource_name: parsed,
                    artifact_key: artifact_key.to_string(),
                    min_lifetime,
                    max_lifetime,
                    params,
                }),
                builder,
            },
        );
        state.order.push(resource_name.to_string());
        Ok(())
    }

    pub fn is_registered(&self, resource_name: &str) -> bool {
        rw_read(&self.state, SOURCE, "is_registered")
            .resources
            .contains_key(resource_name)
    }

    /// Registered resource names, in registration order.
    pub fn resource_names(&self) -> Vec<String> {
        rw_read(&self.state, SOURCE, "resource_names").order.clone()
    }

    /// Fetch a resource's value, rebuilding its artifact when stale.
    /// Requires prior registration through [`Self::create_resource`].
    pub async fn get(&self, resource_name: &str) -> Result<Value, CacheError> {
        let resource = self.registered(resource_name)?;
        self.source
            .get(&resource.entry, resource.builder.as_ref())
            .await
    }

    /// Typed variant of [`Self::get`].
    pub async fn get_as<T: DeserializeOwned>(&self, resource_name: &str) -> Result<T, CacheError> {
        let value = self.get(resource_name).await?;
        serde_json::from_value(value).map_err(|err| CacheError::Decode {
            resource: resource_name.to_string(),
            source: err,
        })
    }

    /// Force-build every registered resource, in registration order.
    pub async fn warm(&self) -> Result<(), CacheError> {
        for resource_name in self.resource_names() {
            let resource = self.registered(&resource_name)?;
            self.source.invalidate(&resource.entry.artifact_key).await;
            self.source
                .get(&resource.entry, resource.builder.as_ref())
                .await?;
        }
        Ok(())
    }

    /// Delete every artifact in the cache directory.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        self.source.clear().await
    }

    fn registered(&self, resource_name: &str) -> Result<RegisteredResource, CacheError> {
        rw_read(&self.state, SOURCE, "get")
            .resources
            .get(resource_name)
            .cloned()
            .ok_or_else(|| CacheError::unregistered(resource_name))
    }
}
