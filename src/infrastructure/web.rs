use actix_cors::Cors;
use actix_web::http::header;

use crate::constants::{RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER};

/// CORS policy for the site's origins. `*` allows any origin.
pub fn build_cors(origins: &[String]) -> Cors {
    let cors = if origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(["GET", "POST", "OPTIONS"])
        .allowed_header(header::CONTENT_TYPE)
        .expose_headers([
            RATE_LIMIT_LIMIT_HEADER,
            RATE_LIMIT_REMAINING_HEADER,
            "Retry-After",
        ])
        .max_age(3600)
}
