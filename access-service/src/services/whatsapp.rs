//! Best-effort WhatsApp notifications through the CallMeBot gateway.
//!
//! Every send is a detached task whose outcome is only logged; notification
//! delivery is never part of any request's success or failure path.

use chrono::Utc;
use reqwest::Client;

use crate::config::WhatsAppConfig;

const CALLMEBOT_API_URL: &str = "https://api.callmebot.com/whatsapp.php";

#[derive(Clone)]
pub struct WhatsAppNotifier {
    client: Client,
    api_key: Option<String>,
    admin_phone: Option<String>,
}

impl WhatsAppNotifier {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            admin_phone: config.admin_phone.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some() && self.admin_phone.is_some()
    }

    async fn send_notification(&self, text: &str) -> Result<(), anyhow::Error> {
        let (Some(api_key), Some(phone)) = (&self.api_key, &self.admin_phone) else {
            return Err(anyhow::anyhow!("WhatsApp gateway is not configured"));
        };

        let response = self
            .client
            .get(CALLMEBOT_API_URL)
            .query(&[("phone", phone.as_str()), ("text", text), ("apikey", api_key)])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to reach WhatsApp gateway: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "WhatsApp gateway returned status {}",
                response.status()
            ));
        }

        Ok(())
    }

    /// Fire-and-forget send; skipped when unconfigured.
    pub fn notify_detached(&self, message: String) {
        if !self.is_enabled() {
            tracing::debug!("WhatsApp gateway not configured, notification skipped");
            return;
        }

        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.send_notification(&message).await {
                Ok(()) => tracing::info!("WhatsApp notification sent"),
                Err(e) => tracing::warn!(error = %e, "WhatsApp notification failed"),
            }
        });
    }

    /// Notify the operator that someone was granted access.
    pub fn notify_access(&self, user_name: &str, access_type: &str, door: Option<&str>) {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let mut message = format!(
            "Access system\nUser: {}\nAccess type: {}\n",
            user_name, access_type
        );
        if let Some(door) = door {
            message.push_str(&format!("Door: {}\n", door));
        }
        message.push_str(&format!("Time: {}", timestamp));
        self.notify_detached(message);
    }

    /// Startup banner sent when the service comes online.
    pub fn notify_startup(&self, service_name: &str, port: u16) {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let message = format!(
            "Backend started\nService: {}\nPort: {}\nTime: {}",
            service_name, port, timestamp
        );
        self.notify_detached(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_credentials() {
        let notifier = WhatsAppNotifier::new(&WhatsAppConfig {
            api_key: None,
            admin_phone: Some("+573001112233".to_string()),
        });
        assert!(!notifier.is_enabled());

        let notifier = WhatsAppNotifier::new(&WhatsAppConfig {
            api_key: Some("key".to_string()),
            admin_phone: Some("+573001112233".to_string()),
        });
        assert!(notifier.is_enabled());
    }

    #[tokio::test]
    async fn detached_notify_without_config_is_a_noop() {
        let notifier = WhatsAppNotifier::new(&WhatsAppConfig {
            api_key: None,
            admin_phone: None,
        });
        // Must not spawn or panic.
        notifier.notify_access("Ana", "NFC ACCESS", Some("MAIN DOOR"));
    }
}
