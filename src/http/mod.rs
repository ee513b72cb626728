mod routes;
mod twiml;
mod types;

#[cfg(feature = "openapi")]
mod openapi;

use crate::config::HTTPConfig;
use crate::http::routes::*;
use crate::http::twiml::TwimlReply;
use crate::relay::{Relay, GENERIC_FAILURE_REPLY};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::any::Any;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::log::{debug, error};

#[cfg(feature = "openapi")]
use utoipa::OpenApi;

#[cfg(feature = "sentry")]
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};

#[derive(Clone)]
pub struct HttpState {
    pub relay: Relay,
    pub config: HTTPConfig,
}

/// The provider treats anything but a 200 TwiML body as a failed delivery, so panics
/// in the webhook still answer with the generic reply.
fn webhook_panic_reply(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    error!("Panic while handling WhatsApp webhook: {detail}");
    TwimlReply::new(GENERIC_FAILURE_REPLY).into_response()
}

pub fn create_app(config: HTTPConfig, relay: Relay, _sentry: bool) -> axum::Router {
    let router = axum::Router::new()
        .route(
            "/whatsapp",
            post(whatsapp_webhook).layer(CatchPanicLayer::custom(webhook_panic_reply)),
        )
        .route("/", get(home))
        .route("/health", get(health))
        .route("/test", get(self_test))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-version"),
            HeaderValue::from_static(crate::VERSION),
        ))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    #[cfg(feature = "openapi")]
    let router = {
        debug!("Adding OpenAPI SwaggerUi at /docs!");
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs")
                .url("/docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    // If Sentry is enabled, include axum integration layers.
    #[cfg(feature = "sentry")]
    let router = if _sentry {
        debug!("Adding Sentry HTTP layer!");
        router
            .layer(
                ServiceBuilder::new()
                    .layer(NewSentryLayer::<axum::http::Request<axum::body::Body>>::new_from_top()),
            )
            .layer(ServiceBuilder::new().layer(SentryHttpLayer::new().enable_transaction()))
    } else {
        router
    };

    debug!(
        "HTTP routes ready, completion client available: {}",
        relay.is_available()
    );

    // Shared HTTP route state.
    let state = HttpState { relay, config };
    router.with_state(state)
}
