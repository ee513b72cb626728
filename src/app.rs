use crate::completion::{CompletionClient, OpenAIClient};
use crate::config::{AppConfig, HTTPConfig};
use crate::http::create_app;
use crate::relay::prompt::SystemPrompt;
use crate::relay::Relay;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::log::{error, info, warn};

#[cfg(feature = "sentry")]
pub type SentryGuard = Option<sentry::ClientInitGuard>;

#[cfg(not(feature = "sentry"))]
pub type SentryGuard = Option<()>;

pub struct AppHandles {
    server: JoinHandle<()>,
    _sentry_guard: SentryGuard,
}
impl AppHandles {
    pub fn new(config: AppConfig, _sentry_guard: SentryGuard) -> AppHandles {
        info!("{}", "=".repeat(70));
        info!("WHATSAPP RELAY STARTING");
        info!("Address: {}", config.http.address);
        info!(
            "Environment: {}",
            if config.is_development() {
                "Development (local)"
            } else {
                "Production"
            }
        );
        info!("{}", "=".repeat(70));

        let client = Self::build_completion_client(&config);
        let relay = Relay::new(client, SystemPrompt::from_config(&config.prompt));
        let server = Self::start_http_server(config.http, relay, _sentry_guard.is_some());

        AppHandles {
            server,
            _sentry_guard,
        }
    }

    pub async fn run(self) {
        match self.server.await {
            Ok(_) => error!("HTTP Server task completed!"),
            Err(e) => error!("HTTP Server task failed: {e:?}!"),
        }
    }

    /// A missing credential or a client that fails to build leaves the relay unconfigured
    /// rather than aborting startup.
    fn build_completion_client(config: &AppConfig) -> Option<Arc<dyn CompletionClient>> {
        let api_key = match &config.openai_api_key {
            Some(api_key) => api_key.clone(),
            None => {
                warn!("No OpenAI credential, replying with the service unavailable message");
                return None;
            }
        };

        match OpenAIClient::new(api_key, &config.completion) {
            Ok(client) => {
                info!(
                    "OpenAI client configured (model: {}, max_tokens: {}, temperature: {})",
                    config.completion.model,
                    config.completion.max_tokens,
                    config.completion.temperature
                );
                let client: Arc<dyn CompletionClient> = Arc::new(client);
                Some(client)
            }
            Err(e) => {
                error!("Failed to construct OpenAI client: {e:?}");
                None
            }
        }
    }

    fn start_http_server(
        config: HTTPConfig,
        relay: Relay,
        _sentry_enabled: bool,
    ) -> JoinHandle<()> {
        let address = config.address;
        let tls_config = config.tls.clone();

        let app = create_app(config, relay, _sentry_enabled);
        tokio::spawn(async move {
            let result = match tls_config {
                Some(_tls_config) => {
                    #[cfg(any(feature = "tls-rustls", feature = "tls-native"))]
                    {
                        info!("Starting HTTPS (secure) server on {address}");

                        #[cfg(feature = "tls-rustls")]
                        {
                            let _ = rustls::crypto::CryptoProvider::install_default(
                                rustls::crypto::aws_lc_rs::default_provider(),
                            );
                            match axum_server::tls_rustls::RustlsConfig::from_pem_file(
                                &_tls_config.certificate_path,
                                &_tls_config.key_path,
                            )
                            .await
                            {
                                Ok(tls) => axum_server::bind_rustls(address, tls)
                                    .serve(app.into_make_service())
                                    .await
                                    .map_err(anyhow::Error::from),
                                Err(e) => Err(anyhow::anyhow!(
                                    "Failed to load rustls TLS certificates: {e}"
                                )),
                            }
                        }

                        #[cfg(all(feature = "tls-native", not(feature = "tls-rustls")))]
                        {
                            match axum_server::tls_openssl::OpenSSLConfig::from_pem_file(
                                &_tls_config.certificate_path,
                                &_tls_config.key_path,
                            ) {
                                Ok(tls) => axum_server::bind_openssl(address, tls)
                                    .serve(app.into_make_service())
                                    .await
                                    .map_err(anyhow::Error::from),
                                Err(e) => Err(anyhow::anyhow!(
                                    "Failed to load openssl TLS certificates: {e}"
                                )),
                            }
                        }
                    }

                    #[cfg(not(any(feature = "tls-rustls", feature = "tls-native")))]
                    Err(anyhow::anyhow!(
                        "HTTP Server TLS configuration provided but no TLS features enabled. Compile with a TLS backend feature!"
                    ))
                }
                None => {
                    info!("Starting HTTP (insecure) server on {address}");
                    axum_server::bind(address)
                        .serve(app.into_make_service())
                        .await
                        .map_err(anyhow::Error::from)
                }
            };

            if let Err(e) = result {
                error!("Server error: {e:?}");
            }
        })
    }
}
