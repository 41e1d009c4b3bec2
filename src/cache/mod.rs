//! Ikarus resource cache.
//!
//! A resource is a named unit of derived data built from the persistent
//! store by a [`ResourceBuilder`] and memoized as an on-disk artifact.
//! The [`CacheRegistry`] maps resource names to their builder, artifact
//! key and lifetime policy; the [`DiskCacheSource`] decides staleness,
//! regenerates on miss and persists artifacts atomically.
//!
//! ## Artifact format
//!
//! One human-readable header line terminated by `\n`, followed by the
//! JSON payload of the builder's value. The header is never parsed back;
//! only the file's modification time participates in staleness checks.

pub mod builder;
pub mod builders;
pub(crate) mod lock;
mod registry;
mod source;

pub use builder::{BuilderParams, ResourceBuilder, resolve_scope};
pub use registry::{CacheEntry, CacheRegistry};
pub use source::DiskCacheSource;

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::DomainError;
use crate::infra::db::StoreError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("resource `{resource}` was requested before registration")]
    Unregistered { resource: String },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A fresh artifact that cannot be read or decoded. Never recovered by
    /// a silent rebuild: it would mask a serialization-format mismatch.
    #[error("cache artifact `{path}` is fresh but unreadable: {detail}")]
    Corrupt { path: PathBuf, detail: String },
    #[error("failed to persist cache artifact `{path}`: {detail}")]
    Persist { path: PathBuf, detail: String },
    #[error("failed to serialize resource `{resource}`: {source}")]
    Serialize {
        resource: String,
        source: serde_json::Error,
    },
    #[error("failed to decode resource `{resource}` into the requested type: {source}")]
    Decode {
        resource: String,
        source: serde_json::Error,
    },
}

impl CacheError {
    pub fn unregistered(resource: impl Into<String>) -> Self {
        Self::Unregistered {
            resource: resource.into(),
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn persist(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Persist {
            path: path.into(),
            detail: detail.into(),
        }
    }
}
