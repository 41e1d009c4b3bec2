use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::builder::{BuilderParams, ResourceBuilder, resolve_scope};
use crate::cache::CacheError;
use crate::domain::tables::{
    ListenerClassGroup, ListenerEntry, ListenerEventGroup, ListenerTable,
};
use crate::domain::ResourceName;
use crate::infra::db::Store;

/// Builds the listener table for a package scope: registration rows
/// regrouped by target class, then event name, preserving row order.
pub struct EventListenerBuilder {
    store: Arc<dyn Store>,
}

impl EventListenerBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceBuilder for EventListenerBuilder {
    async fn build(
        &self,
        resource: &ResourceName,
        params: &BuilderParams,
    ) -> Result<Value, CacheError> {
        let scope = resolve_scope(resource, params)?;
        let packages = self.store.resolve_dependencies(scope).await?;
        let rows = self.store.listener_rows(&packages).await?;

        let mut table = ListenerTable::default();
        for row in rows {
            let class_position = match table
                .classes
                .iter()
                .position(|group| group.class_name == row.target_class)
            {
                Some(position) => position,
                None => {
                    table.classes.push(ListenerClassGroup {
                        class_name: row.target_class.clone(),
                        events: Vec::new(),
                    });
                    table.classes.len() - 1
                }
            };
            let class_group = &mut table.classes[class_position];
            let event_position = match class_group
                .events
                .iter()
                .position(|event| event.event_name == row.event_name)
            {
                Some(position) => position,
                None => {
                    class_group.events.push(ListenerEventGroup {
                        event_name: row.event_name.clone(),
                        listeners: Vec::new(),
                    });
                    class_group.events.len() - 1
                }
            };
            class_group.events[event_position].listeners.push(ListenerEntry {
                listener_class: row.listener_class,
                target_class: row.target_class,
                event_name: row.event_name,
                inherit: row.inherit,
            });
        }
        serde_json::to_value(&table).map_err(|err| CacheError::Serialize {
            resource: resource.to_string(),
            source: err,
        })
    }
}
