//! warren-client
//!
//! Client for the broker management REST API.
//!
//! The reconciliation engine only talks to the [`ManagementApi`] trait;
//! [`HttpClient`] is the production implementation backed by reqwest.

pub mod api;
pub mod config;
pub mod error;
pub mod http;

pub use crate::api::{BoxFuture, Created, ManagementApi, ObjectKey, ObjectKind};
pub use crate::config::ClientConfig;
pub use crate::error::{ApiError, ConfigError};
pub use crate::http::HttpClient;
