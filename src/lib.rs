//! Crop and fertilizer recommendation service.
//!
//! Two pre-trained tree-ensemble classifiers sit behind an [`InferenceFacade`]; a per-user
//! [`Session`] runs the predict / override / predict workflow on top of it, and [`server`]
//! exposes the whole thing over HTTP.

pub mod artifacts;
pub mod config;
pub mod encoder;
pub mod error;
pub mod facade;
pub mod model;
pub mod server;
pub mod session;
pub mod types;
pub mod workflow;

pub use facade::InferenceFacade;
pub use workflow::{Phase, Session};
