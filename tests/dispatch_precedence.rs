//! Dispatch precedence over cached controller-type and route tables.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use ikarus::application::Kernel;
use ikarus::config::{
    CacheSettings, DatabaseSettings, DispatchSettings, LogFormat, LoggingSettings, Settings,
};
use ikarus::dispatch::{
    Controller, ControllerRegistry, ControllerResponse, DispatchError, DispatchPath, Request,
};
use ikarus::events::ListenerRegistry;
use ikarus::infra::db::{ControllerTypeRow, MemoryStore, PackageRow, RouteRow};
use tracing::level_filters::LevelFilter;

struct RecordingController {
    label: &'static str,
    hits: Arc<AtomicUsize>,
}

impl RecordingController {
    fn new(label: &'static str) -> (Arc<Self>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                label,
                hits: hits.clone(),
            }),
            hits,
        )
    }
}

#[async_trait]
impl Controller for RecordingController {
    async fn handle(&self, _request: &Request) -> Result<ControllerResponse, DispatchError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(ControllerResponse {
            body: self.label.to_string(),
        })
    }
}

fn settings(cache_dir: &Path) -> Settings {
    Settings {
        cache: CacheSettings {
            directory: cache_dir.to_path_buf(),
            min_lifetime: 0,
            max_lifetime: 0,
        },
        database: DatabaseSettings {
            url: "postgres://unused/test".to_string(),
            max_connections: 1,
        },
        logging: LoggingSettings {
            level: LevelFilter::WARN,
            format: LogFormat::Compact,
        },
        dispatch: DispatchSettings {
            package_id: 1,
            default_controller: "Index".to_string(),
            default_controller_directory: "core/controllers".to_string(),
        },
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let mut store = MemoryStore::new();
    store.add_package(
        PackageRow {
            package_id: 1,
            identifier: "net.example.core".to_string(),
            directory: "core".to_string(),
        },
        vec![],
    );
    store.add_controller_type(ControllerTypeRow {
        package_id: 1,
        parameter: "page".to_string(),
        controller_directory: "core/pages".to_string(),
    });
    store.add_route(RouteRow {
        package_id: 1,
        parameter: "page".to_string(),
        route_value: "home".to_string(),
        controller_name: "Index".to_string(),
        controller_directory: "core/controllers".to_string(),
    });
    store.add_route(RouteRow {
        package_id: 1,
        parameter: "category".to_string(),
        route_value: "news".to_string(),
        controller_name: "Category".to_string(),
        controller_directory: "core/controllers".to_string(),
    });
    Arc::new(store)
}

#[tokio::test]
async fn controller_type_match_takes_precedence_over_routes() {
    let dir = tempfile::tempdir().unwrap();
    let mut controllers = ControllerRegistry::new();
    let (type_controller, type_hits) = RecordingController::new("type:home");
    let (route_controller, route_hits) = RecordingController::new("route:home");
    // `home` exists both as a controller-type target and as a named route.
    controllers.register("core/pages", "home", type_controller);
    controllers.register("core/controllers", "Index", route_controller);

    let kernel = Kernel::new(
        settings(dir.path()),
        seeded_store(),
        controllers,
        ListenerRegistry::new(),
    )
    .unwrap();

    let request = Request::new("core").with_parameter("page", "home");
    let resolution = kernel.resolve(&request).await.unwrap();
    assert_eq!(
        resolution.path,
        DispatchPath::ControllerType {
            parameter: "page".to_string()
        }
    );

    let response = kernel.dispatch(&request).await.unwrap();
    assert_eq!(response.body, "type:home");
    assert_eq!(type_hits.load(Ordering::SeqCst), 1);
    assert_eq!(route_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unresolvable_controller_type_falls_through_to_routes() {
    let dir = tempfile::tempdir().unwrap();
    let mut controllers = ControllerRegistry::new();
    let (route_controller, route_hits) = RecordingController::new("route:home");
    // No controller registered under `core/pages`, so the controller-type
    // hit for page=home cannot load and the route table takes over.
    controllers.register("core/controllers", "Index", route_controller);

    let kernel = Kernel::new(
        settings(dir.path()),
        seeded_store(),
        controllers,
        ListenerRegistry::new(),
    )
    .unwrap();

    let request = Request::new("core").with_parameter("page", "home");
    let resolution = kernel.resolve(&request).await.unwrap();
    assert_eq!(
        resolution.path,
        DispatchPath::Route {
            parameter: "page".to_string(),
            route_value: "home".to_string()
        }
    );

    let response = kernel.dispatch(&request).await.unwrap();
    assert_eq!(response.body, "route:home");
    assert_eq!(route_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn default_controller_applies_before_route_matching() {
    let dir = tempfile::tempdir().unwrap();
    let mut controllers = ControllerRegistry::new();
    let (default_controller, default_hits) = RecordingController::new("default");
    let (category_controller, category_hits) = RecordingController::new("route:category");
    controllers.register("core/controllers", "Index", default_controller);
    controllers.register("core/controllers", "Category", category_controller);

    let kernel = Kernel::new(
        settings(dir.path()),
        seeded_store(),
        controllers,
        ListenerRegistry::new(),
    )
    .unwrap();

    // `category` is a route key, not a controller-type key: the configured
    // default controller wins before route matching is attempted.
    let request = Request::new("core").with_parameter("category", "news");
    let resolution = kernel.resolve(&request).await.unwrap();
    assert_eq!(resolution.path, DispatchPath::Default);

    let response = kernel.dispatch(&request).await.unwrap();
    assert_eq!(response.body, "default");
    assert_eq!(default_hits.load(Ordering::SeqCst), 1);
    assert_eq!(category_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn routes_match_when_no_default_controller_is_registered() {
    let dir = tempfile::tempdir().unwrap();
    let mut controllers = ControllerRegistry::new();
    let (category_controller, category_hits) = RecordingController::new("route:category");
    controllers.register("core/controllers", "Category", category_controller);

    let kernel = Kernel::new(
        settings(dir.path()),
        seeded_store(),
        controllers,
        ListenerRegistry::new(),
    )
    .unwrap();

    let request = Request::new("core").with_parameter("category", "news");
    let response = kernel.dispatch(&request).await.unwrap();
    assert_eq!(response.body, "route:category");
    assert_eq!(category_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unmatched_request_raises_no_route() {
    let dir = tempfile::tempdir().unwrap();
    let kernel = Kernel::new(
        settings(dir.path()),
        seeded_store(),
        ControllerRegistry::new(),
        ListenerRegistry::new(),
    )
    .unwrap();

    let request = Request::new("core").with_parameter("foo", "bar");
    let err = kernel.dispatch(&request).await.unwrap_err();
    assert!(matches!(err, DispatchError::NoRoute { .. }), "got {err:?}");
}

#[tokio::test]
async fn route_hit_with_missing_controller_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let kernel = Kernel::new(
        settings(dir.path()),
        seeded_store(),
        ControllerRegistry::new(),
        ListenerRegistry::new(),
    )
    .unwrap();

    let request = Request::new("core").with_parameter("category", "news");
    // Resolution still succeeds through the route table.
    let resolution = kernel.resolve(&request).await.unwrap();
    assert_eq!(resolution.controller_name, "Category");

    let err = kernel.dispatch(&request).await.unwrap_err();
    assert!(
        matches!(err, DispatchError::UnknownController { .. }),
        "got {err:?}"
    );
}
