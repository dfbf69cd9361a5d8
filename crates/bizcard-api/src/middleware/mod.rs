//! HTTP 미들웨어.

pub mod metrics;
pub mod request_info;

pub use metrics::metrics_layer;
pub use request_info::attach_request_info;
