use std::collections::HashMap;

use async_trait::async_trait;

use super::{
    ApplicationRow, ControllerTypeRow, LanguageRow, ListenerRow, PackageRow, RouteRow, Store,
    StoreError,
};

/// In-memory [`Store`] backed by plain vectors.
///
/// Used by the test suites and by tooling that operates without a database.
/// Row order is preserved exactly as pushed, matching the `ORDER BY` of the
/// Postgres implementation.
#[derive(Default)]
pub struct MemoryStore {
    packages: Vec<PackageRow>,
    dependencies: HashMap<i64, Vec<i64>>,
    routes: Vec<RouteRow>,
    controller_types: Vec<ControllerTypeRow>,
    listeners: Vec<ListenerRow>,
    languages: Vec<LanguageRow>,
    applications: Vec<ApplicationRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_package(&mut self, package: PackageRow, dependencies: Vec<i64>) -> &mut Self {
        self.dependencies.insert(package.package_id, dependencies);
        self.packages.push(package);
        self
    }

    pub fn add_route(&mut self, route: RouteRow) -> &mut Self {
        self.routes.push(route);
        self
    }

    pub fn add_controller_type(&mut self, controller_type: ControllerTypeRow) -> &mut Self {
        self.controller_types.push(controller_type);
        self
    }

    pub fn add_listener(&mut self, listener: ListenerRow) -> &mut Self {
        self.listeners.push(listener);
        self
    }

    pub fn add_language(&mut self, language: LanguageRow) -> &mut Self {
        self.languages.push(language);
        self
    }

    pub fn add_application(&mut self, application: ApplicationRow) -> &mut Self {
        self.applications.push(application);
        self
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn resolve_dependencies(&self, package_id: i64) -> Result<Vec<i64>, StoreError> {
        if !self.dependencies.contains_key(&package_id) {
            return Err(StoreError::NotFound);
        }
        // Transitive closure, matching the recursive CTE of the Postgres
        // implementation. Cycles terminate through the de-duplication.
        let mut packages = vec![package_id];
        let mut cursor = 0;
        while cursor < packages.len() {
            let current = packages[cursor];
            cursor += 1;
            if let Some(dependencies) = self.dependencies.get(&current) {
                for dependency in dependencies {
                    if !packages.contains(dependency) {
                        packages.push(*dependency);
                    }
                }
            }
        }
        Ok(packages)
    }

    async fn route_rows(&self, packages: &[i64]) -> Result<Vec<RouteRow>, StoreError> {
        Ok(self
            .routes
            .iter()
            .filter(|row| packages.contains(&row.package_id))
            .cloned()
            .collect())
    }

    async fn controller_type_rows(
        &self,
        packages: &[i64],
    ) -> Result<Vec<ControllerTypeRow>, StoreError> {
        Ok(self
            .controller_types
            .iter()
            .filter(|row| packages.contains(&row.package_id))
            .cloned()
            .collect())
    }

    async fn listener_rows(&self, packages: &[i64]) -> Result<Vec<ListenerRow>, StoreError> {
        Ok(self
            .listeners
            .iter()
            .filter(|row| packages.contains(&row.package_id))
            .cloned()
            .collect())
    }

    async fn language_rows(&self) -> Result<Vec<LanguageRow>, StoreError> {
        Ok(self.languages.clone())
    }

    async fn application_rows(&self) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(self.applications.clone())
    }

    async fn package_instance(&self, package_id: i64) -> Result<PackageRow, StoreError> {
        self.packages
            .iter()
            .find(|row| row.package_id == package_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}
