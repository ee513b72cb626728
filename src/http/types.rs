use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum HealthStatus {
    Healthy,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: &'static str,
    pub openai_available: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SelfTestSuccess {
    #[cfg_attr(feature = "openapi", schema(example = "success"))]
    pub status: &'static str,
    pub openai_connected: bool,
    pub test_response: String,
}
impl SelfTestSuccess {
    pub fn new(test_response: String) -> Self {
        Self {
            status: "success",
            openai_connected: true,
            test_response,
        }
    }
}
impl IntoResponse for SelfTestSuccess {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SelfTestFailure {
    #[cfg_attr(feature = "openapi", schema(example = "error"))]
    pub status: &'static str,
    pub openai_connected: bool,
    pub error: String,
}
impl SelfTestFailure {
    pub fn new(error: String) -> Self {
        Self {
            status: "error",
            openai_connected: false,
            error,
        }
    }
}
impl IntoResponse for SelfTestFailure {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

pub type SelfTestResult = Result<SelfTestSuccess, SelfTestFailure>;
