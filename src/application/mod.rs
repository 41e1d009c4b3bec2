//! Application layer: the kernel context object.

pub mod error;

pub use error::{AppError, ErrorClass};

use std::sync::Arc;

use crate::cache::builders::{
    ApplicationListBuilder, ControllerTypeBuilder, EventListenerBuilder, LanguageListBuilder,
    PackageInstanceBuilder, RouteListBuilder,
};
use crate::cache::{CacheError, CacheRegistry, DiskCacheSource};
use crate::config::Settings;
use crate::dispatch::{
    ControllerRegistry, ControllerResponse, DispatchError, Request, RequestDispatcher, Resolution,
};
use crate::domain::tables::{ApplicationTable, LanguageTable, PackageInstance};
use crate::events::{EventError, EventManager, EventSubject, ListenerRegistry};
use crate::infra::db::Store;

/// The explicit context object wiring the subsystems together: one kernel
/// per process, passed to whoever needs cache, dispatch or events. There
/// is no global registry; tests inject an in-memory store and their own
/// controller and listener registries.
pub struct Kernel {
    settings: Settings,
    cache: Arc<CacheRegistry>,
    dispatcher: RequestDispatcher,
    events: EventManager,
}

impl Kernel {
    /// Wire the kernel and register the standard resources for the active
    /// package scope.
    pub fn new(
        settings: Settings,
        store: Arc<dyn Store>,
        controllers: ControllerRegistry,
        listeners: ListenerRegistry,
    ) -> Result<Self, AppError> {
        let source = DiskCacheSource::new(&settings.cache.directory);
        let cache = Arc::new(CacheRegistry::new(source));

        let package_id = settings.dispatch.package_id;
        let min = settings.cache.min_lifetime;
        let max = settings.cache.max_lifetime;

        let scoped = [
            format!("packageInstance-{package_id}"),
            format!("controllerTypes-{package_id}"),
            format!("routes-{package_id}"),
            format!("eventListeners-{package_id}"),
        ];
        let builders: [Arc<dyn crate::cache::ResourceBuilder>; 4] = [
            Arc::new(PackageInstanceBuilder::new(store.clone())),
            Arc::new(ControllerTypeBuilder::new(store.clone())),
            Arc::new(RouteListBuilder::new(store.clone())),
            Arc::new(EventListenerBuilder::new(store.clone())),
        ];
        for (resource, builder) in scoped.iter().zip(builders) {
            cache.create_resource(resource, resource, builder, min, max, Vec::new())?;
        }
        cache.create_resource(
            "applications",
            "applications",
            Arc::new(ApplicationListBuilder::new(store.clone())),
            min,
            max,
            Vec::new(),
        )?;
        cache.create_resource(
            "languages",
            "languages",
            Arc::new(LanguageListBuilder::new(store.clone())),
            min,
            max,
            Vec::new(),
        )?;

        let dispatcher = RequestDispatcher::new(
            cache.clone(),
            controllers,
            package_id,
            settings.dispatch.default_controller.clone(),
            settings.dispatch.default_controller_directory.clone(),
        );
        let events = EventManager::new(cache.clone(), listeners, package_id);

        Ok(Self {
            settings,
            cache,
            dispatcher,
            events,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &CacheRegistry {
        &self.cache
    }

    pub async fn dispatch(&self, request: &Request) -> Result<ControllerResponse, DispatchError> {
        self.dispatcher.dispatch(request).await
    }

    pub async fn resolve(&self, request: &Request) -> Result<Resolution, DispatchError> {
        self.dispatcher.resolve(request).await
    }

    pub async fn fire(
        &self,
        subject: &dyn EventSubject,
        event_name: &str,
    ) -> Result<(), EventError> {
        self.events.fire(subject, event_name).await
    }

    pub async fn applications(&self) -> Result<ApplicationTable, CacheError> {
        self.cache.get_as("applications").await
    }

    pub async fn languages(&self) -> Result<LanguageTable, CacheError> {
        self.cache.get_as("languages").await
    }

    pub async fn package_instance(&self) -> Result<PackageInstance, CacheError> {
        let resource = format!("packageInstance-{}", self.settings.dispatch.package_id);
        self.cache.get_as(&resource).await
    }

    /// Force-build every registered resource.
    pub async fn warm_cache(&self) -> Result<(), CacheError> {
        self.cache.warm().await
    }

    /// Delete all cache artifacts; returns how many were removed.
    pub async fn clear_cache(&self) -> Result<usize, CacheError> {
        self.cache.clear().await
    }
}
