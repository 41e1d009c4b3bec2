//! Event bus over the cached listener table.
//!
//! Dispatch is flattened per concrete class: the first fire for a
//! `(class, event)` pair walks the cached listener table once, collecting
//! exact-class entries plus inherited entries for every ancestor in the
//! subject's capability set, and memoizes the resulting listener chain.
//! Listener instances are created once per manager lifetime and reused.
//!
//! Firing is fire-and-forget from the caller's perspective; a listener may
//! flip flags on the subject (cancellation pattern) which the call site
//! inspects after `fire` returns. `fire` itself never does.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use thiserror::Error;
use tracing::debug;

use crate::cache::lock::{rw_read, rw_write};
use crate::cache::{CacheError, CacheRegistry};
use crate::domain::tables::ListenerTable;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("listener class `{class}` is not registered")]
    UnknownListener { class: String },
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("listener `{listener}` failed handling `{event}`: {message}")]
    Execution {
        listener: String,
        event: String,
        message: String,
    },
}

impl EventError {
    pub fn execution(
        listener: impl Into<String>,
        event: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Execution {
            listener: listener.into(),
            event: event.into(),
            message: message.into(),
        }
    }
}

/// A subject events can be fired on. `class_name` is the concrete type's
/// identity in the listener table; `ancestors` is its declared capability
/// set, consulted for inherited dispatch only.
pub trait EventSubject: Send + Sync {
    fn class_name(&self) -> &str;

    fn ancestors(&self) -> &[&str] {
        &[]
    }

    /// Concrete-type access for listeners that mutate the subject.
    fn as_any(&self) -> &dyn Any;
}

#[async_trait]
pub trait EventListener: Send + Sync {
    async fn execute(&self, subject: &dyn EventSubject, event_name: &str)
    -> Result<(), EventError>;
}

type ListenerFactory = Box<dyn Fn() -> Arc<dyn EventListener> + Send + Sync>;

/// Maps listener class names from the cached table to constructors.
/// Stands in for the class loader of the original system.
#[derive(Default)]
pub struct ListenerRegistry {
    factories: HashMap<String, ListenerFactory>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, class: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn EventListener> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Box::new(factory));
        self
    }

    fn instantiate(&self, class: &str) -> Result<Arc<dyn EventListener>, EventError> {
        let factory = self
            .factories
            .get(class)
            .ok_or_else(|| EventError::UnknownListener {
                class: class.to_string(),
            })?;
        Ok(factory())
    }
}

pub struct EventManager {
    cache: Arc<CacheRegistry>,
    package_id: i64,
    listeners: ListenerRegistry,
    instances: DashMap<String, Arc<dyn EventListener>>,
    chains: DashMap<(String, String), Arc<Vec<String>>>,
    table: RwLock<Option<Arc<ListenerTable>>>,
}

impl EventManager {
    pub fn new(cache: Arc<CacheRegistry>, listeners: ListenerRegistry, package_id: i64) -> Self {
        Self {
            cache,
            package_id,
            listeners,
            instances: DashMap::new(),
            chains: DashMap::new(),
            table: RwLock::new(None),
        }
    }

    pub fn listener_resource(&self) -> String {
        format!("eventListeners-{}", self.package_id)
    }

    /// Fire `event_name` on `subject`, invoking its listener chain in
    /// cache-table registration order.
    pub async fn fire(
        &self,
        subject: &dyn EventSubject,
        event_name: &str,
    ) -> Result<(), EventError> {
        counter!("ikarus_event_fire_total").increment(1);
        let chain = self.chain(subject, event_name).await?;
        for listener_class in chain.iter() {
            let listener = self.instance(listener_class)?;
            listener.execute(subject, event_name).await?;
        }
        Ok(())
    }

    async fn chain(
        &self,
        subject: &dyn EventSubject,
        event_name: &str,
    ) -> Result<Arc<Vec<String>>, EventError> {
        let key = (subject.class_name().to_string(), event_name.to_string());
        if let Some(chain) = self.chains.get(&key) {
            return Ok(chain.clone());
        }

        let table = self.table().await?;
        let mut chain = Vec::new();
        for group in &table.classes {
            let exact = group.class_name == subject.class_name();
            let inherited = !exact
                && subject
                    .ancestors()
                    .iter()
                    .any(|ancestor| *ancestor == group.class_name);
            if !exact && !inherited {
                continue;
            }
            for event in &group.events {
                if event.event_name != event_name {
                    continue;
                }
                for entry in &event.listeners {
                    if exact || entry.inherit {
                        chain.push(entry.listener_class.clone());
                    }
                }
            }
        }
        debug!(
            class = subject.class_name(),
            event = event_name,
            listeners = chain.len(),
            "computed listener chain"
        );
        let chain = Arc::new(chain);
        self.chains.insert(key, chain.clone());
        Ok(chain)
    }

    fn instance(&self, class: &str) -> Result<Arc<dyn EventListener>, EventError> {
        if let Some(instance) = self.instances.get(class) {
            return Ok(instance.clone());
        }
        let instance = self.listeners.instantiate(class)?;
        self.instances.insert(class.to_string(), instance.clone());
        Ok(instance)
    }

    async fn table(&self) -> Result<Arc<ListenerTable>, EventError> {
        if let Some(table) = rw_read(&self.table, "events", "table").as_ref() {
            return Ok(table.clone());
        }
        let loaded: ListenerTable = self.cache.get_as(&self.listener_resource()).await?;
        let loaded = Arc::new(loaded);
        let mut guard = rw_write(&self.table, "events", "table");
        if guard.is_none() {
            *guard = Some(loaded.clone());
        }
        Ok(guard.as_ref().cloned().unwrap_or(loaded))
    }
}
