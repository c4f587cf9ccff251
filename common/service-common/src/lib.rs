//! Service Common - Shared utilities for HTTP services
//!
//! This crate provides the plumbing every service binary needs:
//!
//! - **Initialization**: [`init_tracing`] for standardized logging setup
//! - **Shutdown**: [`shutdown_signal`] resolves on SIGINT/SIGTERM
//!
//! # Example
//!
//! ```rust,ignore
//! service_common::init_tracing("instrument", 0)?;
//!
//! axum::serve(listener, app)
//!     .with_graceful_shutdown(service_common::shutdown_signal())
//!     .await?;
//! ```

pub mod init;
pub mod shutdown;

pub use init::{default_directive, init_tracing};
pub use shutdown::shutdown_signal;
