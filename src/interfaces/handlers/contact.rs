use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
    constants::{CONTACT_PAYLOAD_LIMIT, RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER},
    entities::contact::ContactResponse,
    errors::AppError,
    utils::{get_client_ip::get_client_ip, read_body::read_body},
    AppState,
};

/// POST /api/contact
///
/// The quota is spent before the body is read, so oversized or malformed
/// requests still count against the client.
pub async fn submit_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    mut payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let identifier = get_client_ip(&req, state.trust_x_forwarded_for);
    let handler = &state.contact_handler;

    let decision = handler.check_rate_limit(&identifier).await?;
    let body = read_body(&mut payload, CONTACT_PAYLOAD_LIMIT).await?;
    let receipt = handler.process(&identifier, &decision, &body).await?;

    Ok(HttpResponse::Ok()
        .insert_header((RATE_LIMIT_LIMIT_HEADER, receipt.limit.to_string()))
        .insert_header((RATE_LIMIT_REMAINING_HEADER, receipt.remaining.to_string()))
        .json(ContactResponse {
            message: "Message sent successfully".to_string(),
        }))
}
