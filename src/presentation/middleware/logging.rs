//! Request Logging Middleware
//!
//! HTTP request/response tracing via tower-http.

use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, HttpMakeClassifier, TraceLayer,
};
use tracing::Level;

/// Create the HTTP trace layer used by the main router.
pub fn create_trace_layer() -> TraceLayer<HttpMakeClassifier> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG))
        .on_failure(DefaultOnFailure::new().level(Level::WARN))
}
