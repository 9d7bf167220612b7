//! Push and email delivery transports.
//!
//! Transports are best-effort collaborators: the notification manager logs
//! and skips their failures, it never propagates them into the delivery
//! decision path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use pulse_common::{AppError, AppResult, EmailSettings, PushSettings};
use serde_json::json;

use crate::services::trigger::ProactiveMessage;

/// Push delivery seam.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Send a push notification to all of a user's devices.
    async fn send(&self, user_id: &str, message: &ProactiveMessage) -> AppResult<()>;
}

/// Email delivery seam.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send the message to the user's email address.
    async fn send(&self, user_id: &str, message: &ProactiveMessage) -> AppResult<()>;
}

/// Resolves a user id to an email address.
pub trait RecipientDirectory: Send + Sync {
    /// The user's email address, when one is on file.
    fn email_address(&self, user_id: &str) -> Option<String>;
}

/// Push transport that POSTs to a gateway which fans out to device push
/// providers.
pub struct HttpPushTransport {
    client: reqwest::Client,
    gateway_url: String,
}

impl HttpPushTransport {
    /// Create a push transport from gateway settings.
    pub fn new(settings: &PushSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            gateway_url: settings.gateway_url.clone(),
        })
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send(&self, user_id: &str, message: &ProactiveMessage) -> AppResult<()> {
        let response = self
            .client
            .post(&self.gateway_url)
            .json(&json!({
                "user_id": user_id,
                "title": message.title,
                "body": message.body,
                "priority": message.priority,
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Push gateway request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Push gateway returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Email transport over SMTP.
pub struct SmtpEmailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    directory: Arc<dyn RecipientDirectory>,
}

impl SmtpEmailTransport {
    /// Create an email transport from SMTP settings and a recipient lookup.
    pub fn new(
        settings: &EmailSettings,
        directory: Arc<dyn RecipientDirectory>,
    ) -> AppResult<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
                .map_err(|e| AppError::Config(format!("Invalid SMTP host: {e}")))?
                .port(settings.smtp_port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = format!("{} <{}>", settings.from_name, settings.from_address)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
            directory,
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    async fn send(&self, user_id: &str, message: &ProactiveMessage) -> AppResult<()> {
        let Some(address) = self.directory.email_address(user_id) else {
            return Err(AppError::ExternalService(format!(
                "No email address on file for user {user_id}"
            )));
        };

        let to = address
            .parse::<Mailbox>()
            .map_err(|e| AppError::ExternalService(format!("Invalid recipient address: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.title)
            .body(message.body.clone())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP send failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapDirectory(HashMap<String, String>);

    impl RecipientDirectory for MapDirectory {
        fn email_address(&self, user_id: &str) -> Option<String> {
            self.0.get(user_id).cloned()
        }
    }

    #[test]
    fn test_directory_lookup() {
        let mut map = HashMap::new();
        map.insert("u1".to_string(), "u1@example.com".to_string());
        let directory = MapDirectory(map);
        assert_eq!(
            directory.email_address("u1"),
            Some("u1@example.com".to_string())
        );
        assert_eq!(directory.email_address("u2"), None);
    }

    #[test]
    fn test_push_transport_construction() {
        let settings = PushSettings {
            gateway_url: "https://push.example.com/send".to_string(),
            timeout_secs: 5,
        };
        assert!(HttpPushTransport::new(&settings).is_ok());
    }
}
