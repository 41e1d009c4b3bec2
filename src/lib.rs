//! Ikarus application kernel.
//!
//! Three cooperating subsystems behind one context object ([`application::Kernel`]):
//!
//! - **Resource cache** ([`cache`]): named units of derived data, built
//!   from the persistent store by pluggable builders and memoized as
//!   on-disk artifacts with a lifetime window.
//! - **Request dispatch** ([`dispatch`]): resolves an inbound parameter
//!   set against cached controller-type and route tables, controller
//!   types first, and executes the selected controller.
//! - **Event bus** ([`events`]): fans notifications out to cached
//!   listener chains, with inherited dispatch for subjects whose
//!   capability set covers the registered target class.
//!
//! The HTTP layer, templating and installer of the surrounding system are
//! external collaborators; their contract is limited to requesting cached
//! resources by name and supplying request-parameter maps.

pub mod application;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod events;
pub mod infra;
