use crate::http::twiml::TwimlReply;
use crate::http::types::{
    HealthResponse, HealthStatus, SelfTestFailure, SelfTestResult, SelfTestSuccess,
};
use crate::http::HttpState;
use crate::completion::CompletionError;
use crate::relay::{InboundMessage, GENERIC_FAILURE_REPLY};
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::Html;
use axum::{Form, Json};
use tracing::log::{error, info};

const HOME_PAGE: &str = include_str!("home.html");

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/whatsapp",
    tag = "Webhook",
    request_body(content = crate::relay::InboundMessage, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "TwiML messaging response with one reply message", content_type = "application/xml", body = String)
    )
))]
pub async fn whatsapp_webhook(
    State(state): State<HttpState>,
    form: Result<Form<InboundMessage>, FormRejection>,
) -> TwimlReply {
    let reply = match form {
        Ok(Form(message)) => state.relay.reply_to(message).await,
        Err(rejection) => {
            error!("Could not read WhatsApp webhook form: {rejection}");
            GENERIC_FAILURE_REPLY.to_string()
        }
    };

    TwimlReply::new(reply)
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/",
    tag = "System",
    responses(
        (status = 200, description = "Static landing page", content_type = "text/html", body = String)
    )
))]
pub async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, body = crate::http::types::HealthResponse,
            example = json!({"status": "healthy", "service": "Metro WhatsApp Bot", "version": "1.0.0", "openai_available": true}))
    )
))]
pub async fn health(State(state): State<HttpState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        service: state.config.service_name.clone(),
        version: crate::VERSION,
        openai_available: state.relay.is_available(),
    })
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/test",
    tag = "System",
    responses(
        (status = 200, body = crate::http::types::SelfTestSuccess),
        (status = 500, body = crate::http::types::SelfTestFailure)
    )
))]
pub async fn self_test(State(state): State<HttpState>) -> SelfTestResult {
    match state.relay.self_test().await {
        Ok(reply) => {
            info!("Self-test succeeded");
            Ok(SelfTestSuccess::new(reply))
        }
        Err(e) => {
            error!("Self-test failed: {e}");
            let detail = match e {
                CompletionError::NotConfigured => e.fallback_reply().to_string(),
                _ => e.to_string(),
            };
            Err(SelfTestFailure::new(detail))
        }
    }
}
