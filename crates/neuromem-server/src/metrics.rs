//! Prometheus metrics for the HTTP surface.

use axum::http::StatusCode;
use metrics::counter;

/// Record a handled request
pub fn record_request(route: &'static str) {
    counter!("neuromem_http_requests_total", "route" => route).increment(1);
}

/// Record a request that ended in an error response
pub fn record_error(status: StatusCode) {
    counter!("neuromem_http_errors_total", "status" => status.as_u16().to_string()).increment(1);
}

/// Record a tensor accepted for storage
pub fn record_save(elements: usize) {
    counter!("neuromem_saves_accepted_total").increment(1);
    counter!("neuromem_save_elements_total").increment(elements as u64);
}
