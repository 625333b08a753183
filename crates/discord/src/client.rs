use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::DiscordConfig;
use crate::error::DiscordError;
use crate::types::InteractionReply;

/// Classified result of the single delivery PATCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The deferred reply was edited.
    Delivered,
    /// HTTP 404: the interaction token expired or was invalidated.
    TokenExpired,
    /// Anything else: rate limit, server error, transport failure.
    /// Not retried; the analysis record stands on its own.
    Transient {
        status: Option<u16>,
        message: String,
    },
}

/// Sink for the deferred-interaction edit.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Edit the original deferred reply. Infallible by construction: every
    /// failure mode maps onto a [`DeliveryOutcome`] variant.
    async fn edit_original(
        &self,
        application_id: &str,
        interaction_token: &str,
        reply: &InteractionReply,
    ) -> DeliveryOutcome;
}

/// HTTP client performing the deferred-interaction PATCH.
pub struct InteractionClient {
    client: Client,
    config: DiscordConfig,
}

impl InteractionClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DiscordConfig) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DiscordError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn edit_url(&self, application_id: &str, interaction_token: &str) -> String {
        format!(
            "{}/webhooks/{application_id}/{interaction_token}/messages/@original",
            self.config.api_base
        )
    }

    /// Verify the chat platform API is reachable.
    ///
    /// GETs the unauthenticated gateway endpoint; any HTTP response counts
    /// as reachable.
    pub async fn health_check(&self) -> Result<(), DiscordError> {
        let url = format!("{}/gateway", self.config.api_base);
        self.client
            .get(&url)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| DiscordError::Unreachable(e.to_string()))
    }
}

#[async_trait]
impl DeliverySink for InteractionClient {
    #[instrument(skip(self, interaction_token, reply), fields(application_id))]
    async fn edit_original(
        &self,
        application_id: &str,
        interaction_token: &str,
        reply: &InteractionReply,
    ) -> DeliveryOutcome {
        let url = self.edit_url(application_id, interaction_token);

        debug!("editing deferred interaction reply");

        let response = match self.client.patch(&url).json(reply).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "interaction edit transport failure");
                return DeliveryOutcome::Transient {
                    status: None,
                    message: e.to_string(),
                };
            }
        };

        let status = response.status();
        if status.is_success() {
            return DeliveryOutcome::Delivered;
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("interaction token expired or unknown");
            return DeliveryOutcome::TokenExpired;
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "interaction edit rejected");
        DeliveryOutcome::Transient {
            status: Some(status.as_u16()),
            message: body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockInteractionServer {
        listener: tokio::net::TcpListener,
        base_url: String,
    }

    impl MockInteractionServer {
        async fn start() -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            let base_url = format!("http://127.0.0.1:{port}");
            Self { listener, base_url }
        }

        /// Answer one request; returns the raw request bytes received.
        async fn respond_once(self, status_code: u16, body: &str) -> String {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};

            let body = body.to_owned();
            let (mut stream, _) = self.listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16384];
            let n = stream.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();

            let response = format!(
                "HTTP/1.1 {status_code} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        }
    }

    fn reply() -> InteractionReply {
        InteractionReply {
            content: Some("analysis ready".into()),
            embeds: None,
        }
    }

    #[tokio::test]
    async fn delivered_on_success() {
        let server = MockInteractionServer::start().await;
        let client = InteractionClient::new(DiscordConfig::with_api_base(&server.base_url)).unwrap();

        let handle = tokio::spawn(async move { server.respond_once(200, r#"{"id":"1"}"#).await });

        let outcome = client.edit_original("app-1", "tok-abc", &reply()).await;
        let request = handle.await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        // The PATCH targets the @original message for this token.
        assert!(request.starts_with("PATCH /webhooks/app-1/tok-abc/messages/@original"));
    }

    #[tokio::test]
    async fn token_expired_on_404() {
        let server = MockInteractionServer::start().await;
        let client = InteractionClient::new(DiscordConfig::with_api_base(&server.base_url)).unwrap();

        let handle = tokio::spawn(async move {
            server
                .respond_once(404, r#"{"message":"Unknown Webhook"}"#)
                .await
        });

        let outcome = client.edit_original("app-1", "tok-old", &reply()).await;
        handle.await.unwrap();

        assert_eq!(outcome, DeliveryOutcome::TokenExpired);
    }

    #[tokio::test]
    async fn transient_on_server_error() {
        let server = MockInteractionServer::start().await;
        let client = InteractionClient::new(DiscordConfig::with_api_base(&server.base_url)).unwrap();

        let handle = tokio::spawn(async move {
            server.respond_once(503, r#"{"message":"try later"}"#).await
        });

        let outcome = client.edit_original("app-1", "tok", &reply()).await;
        handle.await.unwrap();

        assert!(matches!(
            outcome,
            DeliveryOutcome::Transient {
                status: Some(503),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn transient_on_rate_limit() {
        let server = MockInteractionServer::start().await;
        let client = InteractionClient::new(DiscordConfig::with_api_base(&server.base_url)).unwrap();

        let handle = tokio::spawn(async move {
            server
                .respond_once(429, r#"{"message":"rate limited"}"#)
                .await
        });

        let outcome = client.edit_original("app-1", "tok", &reply()).await;
        handle.await.unwrap();

        // No retry on delivery, even for a rate limit.
        assert!(matches!(
            outcome,
            DeliveryOutcome::Transient {
                status: Some(429),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn health_check_reports_reachability() {
        let server = MockInteractionServer::start().await;
        let client = InteractionClient::new(DiscordConfig::with_api_base(&server.base_url)).unwrap();

        let handle =
            tokio::spawn(async move { server.respond_once(200, r#"{"url":"wss://x"}"#).await });
        client.health_check().await.unwrap();
        handle.await.unwrap();

        let dead =
            InteractionClient::new(DiscordConfig::with_api_base("http://127.0.0.1:1")).unwrap();
        assert!(dead.health_check().await.is_err());
    }

    #[tokio::test]
    async fn transient_on_unreachable_host() {
        let client =
            InteractionClient::new(DiscordConfig::with_api_base("http://127.0.0.1:1")).unwrap();
        let outcome = client.edit_original("app-1", "tok", &reply()).await;
        assert!(matches!(
            outcome,
            DeliveryOutcome::Transient { status: None, .. }
        ));
    }
}
