use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::dispatch::DispatchError;
use crate::domain::DomainError;
use crate::events::EventError;
use crate::infra::db::StoreError;
use crate::infra::error::InfraError;

/// How the outer HTTP collaborator should classify a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 404-class: the request resolved to nothing.
    NotFound,
    /// 503-class: the persistent store is unreachable.
    Unavailable,
    /// 500-class: configuration or corruption failures.
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Dispatch(DispatchError::NoRoute { .. }) => ErrorClass::NotFound,
            AppError::Store(StoreError::Persistence(_))
            | AppError::Store(StoreError::Timeout)
            | AppError::Cache(CacheError::Store(_))
            | AppError::Dispatch(DispatchError::Cache(CacheError::Store(_)))
            | AppError::Infra(InfraError::Database { .. }) => ErrorClass::Unavailable,
            _ => ErrorClass::Internal,
        }
    }
}
