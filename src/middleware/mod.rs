//! Middleware for observability.
//!
//! Request logging with latency tracking.

pub mod logging;

pub use logging::request_logging_simple;
