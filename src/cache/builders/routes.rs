use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::builder::{BuilderParams, ResourceBuilder, resolve_scope};
use crate::cache::CacheError;
use crate::domain::tables::{
    ControllerTypeEntry, ControllerTypeTable, RouteParameterEntry, RouteTable, RouteTarget,
    RouteValueEntry,
};
use crate::domain::ResourceName;
use crate::infra::db::Store;

/// Builds the route table for a package scope: persisted route rows
/// regrouped by `(parameter, route value)`, preserving row order.
pub struct RouteListBuilder {
    store: Arc<dyn Store>,
}

impl RouteListBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceBuilder for RouteListBuilder {
    async fn build(
        &self,
        resource: &ResourceName,
        params: &BuilderParams,
    ) -> Result<Value, CacheError> {
        let scope = resolve_scope(resource, params)?;
        let packages = self.store.resolve_dependencies(scope).await?;
        let rows = self.store.route_rows(&packages).await?;

        let mut table = RouteTable::default();
        for row in rows {
            let position = match table
                .parameters
                .iter()
                .position(|entry| entry.parameter == row.parameter)
            {
                Some(position) => position,
                None => {
                    table.parameters.push(RouteParameterEntry {
                        parameter: row.parameter.clone(),
                        routes: Vec::new(),
                    });
                    table.parameters.len() - 1
                }
            };
            table.parameters[position].routes.push(RouteValueEntry {
                route_value: row.route_value,
                target: RouteTarget {
                    controller_name: row.controller_name,
                    controller_directory: row.controller_directory,
                },
            });
        }
        serde_json::to_value(&table).map_err(|err| CacheError::Serialize {
            resource: resource.to_string(),
            source: err,
        })
    }
}

/// Builds the controller-type table for a package scope. The first row for
/// a given parameter wins; later registrations of the same parameter are
/// shadowed.
pub struct ControllerTypeBuilder {
    store: Arc<dyn Store>,
}

impl ControllerTypeBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceBuilder for ControllerTypeBuilder {
    async fn build(
        &self,
        resource: &ResourceName,
        params: &BuilderParams,
    ) -> Result<Value, CacheError> {
        let scope = resolve_scope(resource, params)?;
        let packages = self.store.resolve_dependencies(scope).await?;
        let rows = self.store.controller_type_rows(&packages).await?;

        let mut table = ControllerTypeTable::default();
        for row in rows {
            if table
                .entries
                .iter()
                .any(|entry| entry.parameter == row.parameter)
            {
                continue;
            }
            table.entries.push(ControllerTypeEntry {
                parameter: row.parameter,
                controller_directory: row.controller_directory,
            });
        }
        serde_json::to_value(&table).map_err(|err| CacheError::Serialize {
            resource: resource.to_string(),
            source: err,
        })
    }
}
