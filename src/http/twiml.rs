use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A TwiML messaging response holding exactly one reply message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwimlReply {
    message: String,
}
impl TwimlReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn to_xml(&self) -> String {
        format!(
            "{XML_DECLARATION}<Response><Message>{}</Message></Response>",
            escape_xml(&self.message)
        )
    }
}
impl IntoResponse for TwimlReply {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/xml")],
            self.to_xml(),
        )
            .into_response()
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
