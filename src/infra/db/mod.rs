//! Persistence seam for the cache builders.
//!
//! Builders never see SQL; they consume flat rows from the [`Store`] trait
//! and reshape them. The Postgres implementation owns the schema contract,
//! the in-memory implementation backs tests and offline tooling.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("record not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RouteRow {
    pub package_id: i64,
    pub parameter: String,
    pub route_value: String,
    pub controller_name: String,
    pub controller_directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ControllerTypeRow {
    pub package_id: i64,
    pub parameter: String,
    pub controller_directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ListenerRow {
    pub package_id: i64,
    pub listener_class: String,
    pub target_class: String,
    pub event_name: String,
    pub inherit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LanguageRow {
    pub language_id: i64,
    pub language_code: String,
    pub country_code: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ApplicationRow {
    pub package_id: i64,
    pub abbreviation: String,
    pub directory: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PackageRow {
    pub package_id: i64,
    pub identifier: String,
    pub directory: String,
}

/// Read-only access to the rows the cache builders derive resources from.
///
/// Scoped queries receive the already-resolved package set; dependency
/// resolution itself is also part of this trait because only the store
/// knows the dependency graph.
#[async_trait]
pub trait Store: Send + Sync {
    /// Resolve a package and its transitive dependencies. The returned set
    /// always contains `package_id` itself.
    async fn resolve_dependencies(&self, package_id: i64) -> Result<Vec<i64>, StoreError>;

    async fn route_rows(&self, packages: &[i64]) -> Result<Vec<RouteRow>, StoreError>;

    async fn controller_type_rows(
        &self,
        packages: &[i64],
    ) -> Result<Vec<ControllerTypeRow>, StoreError>;

    async fn listener_rows(&self, packages: &[i64]) -> Result<Vec<ListenerRow>, StoreError>;

    async fn language_rows(&self) -> Result<Vec<LanguageRow>, StoreError>;

    async fn application_rows(&self) -> Result<Vec<ApplicationRow>, StoreError>;

    async fn package_instance(&self, package_id: i64) -> Result<PackageRow, StoreError>;
}
