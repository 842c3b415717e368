/// Middleware module
///
/// Bearer token authentication and request logging.

mod bearer;
mod request_logger;

pub use bearer::{extract_bearer_token, BearerAuth};
pub use request_logger::{current_request_id, RequestLogger};
