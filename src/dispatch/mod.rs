//! Request dispatch over cached controller-type and route tables.
//!
//! Resolution precedence per request:
//!
//! 1. Controller-type match: the first table entry (registration order)
//!    whose parameter is present in the request selects a controller by
//!    the parameter's value. An unknown controller falls through instead
//!    of failing.
//! 2. Default controller, only when the request supplies none of the
//!    recognized controller-type keys.
//! 3. Named-route match: the first route parameter (table order) present
//!    in the request whose value hits the route table.
//! 4. Otherwise a typed no-route failure, the 404-class outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheError, CacheRegistry};
use crate::domain::tables::{ControllerTypeTable, RouteTable};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matched the request for application `{application}`")]
    NoRoute { application: String },
    #[error("controller `{name}` is not registered under `{directory}`")]
    UnknownController { directory: String, name: String },
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("controller `{controller}` failed: {message}")]
    Execution { controller: String, message: String },
}

impl DispatchError {
    pub fn execution(controller: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            controller: controller.into(),
            message: message.into(),
        }
    }
}

/// An inbound request after HTTP parameter parsing, which happens outside
/// this crate.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub application: String,
    parameters: HashMap<String, String>,
}

impl Request {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            parameters: HashMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ControllerResponse {
    pub body: String,
}

#[async_trait]
pub trait Controller: Send + Sync {
    async fn handle(&self, request: &Request) -> Result<ControllerResponse, DispatchError>;
}

/// Maps `(controller directory, controller name)` to an executable
/// controller. Stands in for the class loader of the original system.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<(String, String), Arc<dyn Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        directory: impl Into<String>,
        name: impl Into<String>,
        controller: Arc<dyn Controller>,
    ) -> &mut Self {
        self.controllers
            .insert((directory.into(), name.into()), controller);
        self
    }

    pub fn resolve(&self, directory: &str, name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers
            .get(&(directory.to_string(), name.to_string()))
            .cloned()
    }

    pub fn contains(&self, directory: &str, name: &str) -> bool {
        self.controllers
            .contains_key(&(directory.to_string(), name.to_string()))
    }
}

/// How a resolution was reached; reported by dry-run tooling and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPath {
    ControllerType { parameter: String },
    Default,
    Route { parameter: String, route_value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub controller_name: String,
    pub controller_directory: String,
    pub path: DispatchPath,
}

pub struct RequestDispatcher {
    cache: Arc<CacheRegistry>,
    controllers: ControllerRegistry,
    package_id: i64,
    default_controller: String,
    default_controller_directory: String,
}

impl RequestDispatcher {
    pub fn new(
        cache: Arc<CacheRegistry>,
        controllers: ControllerRegistry,
        package_id: i64,
        default_controller: impl Into<String>,
        default_controller_directory: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            controllers,
            package_id,
            default_controller: default_controller.into(),
            default_controller_directory: default_controller_directory.into(),
        }
    }

    pub fn controller_type_resource(&self) -> String {
        format!("controllerTypes-{}", self.package_id)
    }

    pub fn route_resource(&self) -> String {
        format!("routes-{}", self.package_id)
    }

    /// Resolve the controller a request maps to without executing it.
    pub async fn resolve(&self, request: &Request) -> Result<Resolution, DispatchError> {
        let controller_types: ControllerTypeTable = self
            .cache
            .get_as(&self.controller_type_resource())
            .await?;

        let mut matched_controller_type = false;
        for entry in &controller_types.entries {
            let Some(controller_name) = request.parameter(&entry.parameter) else {
                continue;
            };
            matched_controller_type = true;
            if self
                .controllers
                .contains(&entry.controller_directory, controller_name)
            {
                return Ok(Resolution {
                    controller_name: controller_name.to_string(),
                    controller_directory: entry.controller_directory.clone(),
                    path: DispatchPath::ControllerType {
                        parameter: entry.parameter.clone(),
                    },
                });
            }
            // Unknown controller: fall through to the remaining entries and
            // then to route matching.
            debug!(
                parameter = %entry.parameter,
                controller = controller_name,
                directory = %entry.controller_directory,
                "controller-type match did not resolve to a registered controller"
            );
        }

        if !matched_controller_type
            && self
                .controllers
                .contains(&self.default_controller_directory, &self.default_controller)
        {
            return Ok(Resolution {
                controller_name: self.default_controller.clone(),
                controller_directory: self.default_controller_directory.clone(),
                path: DispatchPath::Default,
            });
        }

        let routes: RouteTable = self.cache.get_as(&self.route_resource()).await?;
        for entry in &routes.parameters {
            let Some(route_value) = request.parameter(&entry.parameter) else {
                continue;
            };
            if let Some(target) = routes.lookup(&entry.parameter, route_value) {
                return Ok(Resolution {
                    controller_name: target.controller_name.clone(),
                    controller_directory: target.controller_directory.clone(),
                    path: DispatchPath::Route {
                        parameter: entry.parameter.clone(),
                        route_value: route_value.to_string(),
                    },
                });
            }
        }

        Err(DispatchError::NoRoute {
            application: request.application.clone(),
        })
    }

    /// Resolve and execute the controller for a request.
    pub async fn dispatch(&self, request: &Request) -> Result<ControllerResponse, DispatchError> {
        let started = Instant::now();
        let resolution = self.resolve(request).await?;
        let controller = self
            .controllers
            .resolve(&resolution.controller_directory, &resolution.controller_name)
            .ok_or_else(|| DispatchError::UnknownController {
                directory: resolution.controller_directory.clone(),
                name: resolution.controller_name.clone(),
            })?;
        let response = controller.handle(request).await;
        histogram!("ikarus_dispatch_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopController;

    #[async_trait]
    impl Controller for NoopController {
        async fn handle(&self, _request: &Request) -> Result<ControllerResponse, DispatchError> {
            Ok(ControllerResponse {
                body: String::new(),
            })
        }
    }

    #[test]
    fn controller_registry_resolves_by_directory_and_name() {
        let mut registry = ControllerRegistry::new();
        registry.register("core/controllers", "Index", Arc::new(NoopController));

        assert!(registry.contains("core/controllers", "Index"));
        assert!(registry.resolve("core/controllers", "Index").is_some());
        assert!(!registry.contains("core/controllers", "Missing"));
        assert!(!registry.contains("other", "Index"));
    }

    #[test]
    fn request_parameters_are_reachable_by_name() {
        let request = Request::new("core")
            .with_parameter("page", "home")
            .with_parameter("category", "news");
        assert_eq!(request.parameter("page"), Some("home"));
        assert_eq!(request.parameter("missing"), None);
    }
}
