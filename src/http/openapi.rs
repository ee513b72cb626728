use crate::http::routes::*;
use utoipa::Modify;

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "WhatsApp Relay",
    ),
    tags(
        (name = "Webhook", description = "Inbound Twilio WhatsApp messages answered in TwiML"),
        (name = "System", description = "Landing page, health and completion self-test")
    ),
    paths(
        whatsapp_webhook,
        home,
        health,
        self_test,
    ),
    modifiers(&OpenApiModifier)
)]
pub struct ApiDoc;

struct OpenApiModifier;
impl Modify for OpenApiModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info = utoipa::openapi::InfoBuilder::new()
            .title("WhatsApp Relay")
            .version(crate::VERSION)
            .description(Some(env!("CARGO_PKG_DESCRIPTION")))
            .license(Some(
                utoipa::openapi::LicenseBuilder::new()
                    .name(env!("CARGO_PKG_LICENSE"))
                    .url(Some(format!(
                        "https://spdx.org/licenses/{}.html",
                        env!("CARGO_PKG_LICENSE")
                    )))
                    .build(),
            ))
            .build();
    }
}
