//! The builder family: one variant per resource kind.
//!
//! Every variant issues one scoped query through the [`Store`] seam and
//! regroups the flat rows into the table shapes in [`crate::domain::tables`].
//!
//! [`Store`]: crate::infra::db::Store

mod applications;
mod instances;
mod languages;
mod listeners;
mod routes;

pub use applications::ApplicationListBuilder;
pub use instances::PackageInstanceBuilder;
pub use languages::LanguageListBuilder;
pub use listeners::EventListenerBuilder;
pub use routes::{ControllerTypeBuilder, RouteListBuilder};
