//! HTTP surface: router, handler state, error mapping.

mod http;

pub use http::{ApiError, AppState, router};
