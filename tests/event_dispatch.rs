//! Listener-chain dispatch: inheritance, instance reuse, cancellation.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use ikarus::application::Kernel;
use ikarus::config::{
    CacheSettings, DatabaseSettings, DispatchSettings, LogFormat, LoggingSettings, Settings,
};
use ikarus::dispatch::ControllerRegistry;
use ikarus::events::{EventError, EventListener, EventSubject, ListenerRegistry};
use ikarus::infra::db::{ListenerRow, MemoryStore, PackageRow};
use tracing::level_filters::LevelFilter;

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

struct Dog {
    cancelled: AtomicBool,
}

impl Dog {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }
}

impl EventSubject for Dog {
    fn class_name(&self) -> &str {
        "Dog"
    }

    fn ancestors(&self) -> &[&str] {
        &["Animal"]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct CountingListener {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl EventListener for CountingListener {
    async fn execute(
        &self,
        _subject: &dyn EventSubject,
        _event_name: &str,
    ) -> Result<(), EventError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct CancellingListener;

#[async_trait]
impl EventListener for CancellingListener {
    async fn execute(
        &self,
        subject: &dyn EventSubject,
        _event_name: &str,
    ) -> Result<(), EventError> {
        if let Some(dog) = subject.as_any().downcast_ref::<Dog>() {
            dog.cancelled.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

fn store_with_listener(inherit: bool) -> Arc<MemoryStore> {
    let mut store = MemoryStore::new();
    store.add_package(
        PackageRow {
            package_id: 1,
            identifier: "net.example.core".to_string(),
            directory: "core".to_string(),
        },
        vec![],
    );
    store.add_listener(ListenerRow {
        package_id: 1,
        listener_class: "AnimalCreatedListener".to_string(),
        target_class: "Animal".to_string(),
        event_name: "created".to_string(),
        inherit,
    });
    Arc::new(store)
}

fn kernel_with(
    store: Arc<MemoryStore>,
    listeners: ListenerRegistry,
    cache_dir: &Path,
) -> Kernel {
    Kernel::new(
        settings(cache_dir),
        store,
        ControllerRegistry::new(),
        listeners,
    )
    .unwrap()
}

#[tokio::test]
async fn inherited_listener_fires_for_subclass_when_inherit_is_set() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut listeners = ListenerRegistry::new();
    let listener_calls = calls.clone();
    listeners.register("AnimalCreatedListener", move || {
        Arc::new(CountingListener {
            calls: listener_calls.clone(),
        })
    });

    let kernel = kernel_with(store_with_listener(true), listeners, dir.path());
    kernel.fire(&Dog::new(), "created").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn inherited_listener_is_skipped_without_the_inherit_flag() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut listeners = ListenerRegistry::new();
    let listener_calls = calls.clone();
    listeners.register("AnimalCreatedListener", move || {
        Arc::new(CountingListener {
            calls: listener_calls.clone(),
        })
    });

    let kernel = kernel_with(store_with_listener(false), listeners, dir.path());
    kernel.fire(&Dog::new(), "created").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exact_class_listener_fires_regardless_of_inherit() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = MemoryStore::new();
    store.add_package(
        PackageRow {
            package_id: 1,
            identifier: "net.example.core".to_string(),
            directory: "core".to_string(),
        },
        vec![],
    );
    store.add_listener(ListenerRow {
        package_id: 1,
        listener_class: "DogCreatedListener".to_string(),
        target_class: "Dog".to_string(),
        event_name: "created".to_string(),
        inherit: false,
    });

    let calls = Arc::new(AtomicUsize::new(0));
    let mut listeners = ListenerRegistry::new();
    let listener_calls = calls.clone();
    listeners.register("DogCreatedListener", move || {
        Arc::new(CountingListener {
            calls: listener_calls.clone(),
        })
    });

    let kernel = kernel_with(Arc::new(store), listeners, dir.path());
    kernel.fire(&Dog::new(), "created").await.unwrap();
    kernel.fire(&Dog::new(), "destroyed").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn one_listener_instance_is_reused_across_fires() {
    let dir = tempfile::tempdir().unwrap();
    let instantiations = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let mut listeners = ListenerRegistry::new();
    let factory_instantiations = instantiations.clone();
    let listener_calls = calls.clone();
    listeners.register("AnimalCreatedListener", move || {
        factory_instantiations.fetch_add(1, Ordering::SeqCst);
        Arc::new(CountingListener {
            calls: listener_calls.clone(),
        })
    });

    let kernel = kernel_with(store_with_listener(true), listeners, dir.path());
    kernel.fire(&Dog::new(), "created").await.unwrap();
    kernel.fire(&Dog::new(), "created").await.unwrap();

    assert_eq!(instantiations.load(Ordering::SeqCst), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_listener_class_is_fatal_for_that_fire() {
    let dir = tempfile::tempdir().unwrap();
    let kernel = kernel_with(store_with_listener(true), ListenerRegistry::new(), dir.path());
    let err = kernel.fire(&Dog::new(), "created").await.unwrap_err();
    assert!(
        matches!(err, EventError::UnknownListener { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn call_site_observes_cancellation_after_fire_returns() {
    let dir = tempfile::tempdir().unwrap();
    let mut listeners = ListenerRegistry::new();
    listeners.register("AnimalCreatedListener", || Arc::new(CancellingListener));

    let kernel = kernel_with(store_with_listener(true), listeners, dir.path());
    let dog = Dog::new();
    kernel.fire(&dog, "created").await.unwrap();
    // Dispatch itself never inspects the flag; the firing call site does.
    assert!(dog.cancelled.load(Ordering::SeqCst));
}
