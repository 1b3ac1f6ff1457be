use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use staffgate_application::RevocationPublisher;
use staffgate_domain::RevocationEvent;

/// Channel every revocation event is published on.
const BROADCAST_CHANNEL: &str = "access_control";

/// Settings for the broadcast endpoint.
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Endpoint URL; `None` disables publishing entirely.
    pub url: Option<String>,
    /// Service key sent as both `apikey` and bearer token.
    pub service_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// HTTP publisher pushing revocation events to the broadcast endpoint.
///
/// Delivery is strictly best-effort: failures are logged and reported as
/// `false`, never as an error.
pub struct HttpRevocationPublisher {
    http_client: reqwest::Client,
    config: BroadcastConfig,
}

impl HttpRevocationPublisher {
    /// Creates a publisher with the provided client and settings.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: BroadcastConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }
}

/// Builds the wire message for one revocation event.
///
/// The inner payload travels as a JSON string because the broadcast
/// endpoint relays it to subscribers verbatim.
fn broadcast_message(event: &RevocationEvent) -> Value {
    let payload = serde_json::json!({
        "event_type": "ACCESS_REVOKED",
        "payload": {
            "user_id": event.principal_id,
            "revoked_by": event.revoked_by,
            "revocation_reason": event.reason,
            "revoked_at": event.revoked_at.to_rfc3339(),
            "access_type": event.kind.as_str(),
        },
    });

    serde_json::json!({
        "channel": BROADCAST_CHANNEL,
        "payload": payload.to_string(),
    })
}

#[async_trait]
impl RevocationPublisher for HttpRevocationPublisher {
    async fn publish(&self, event: &RevocationEvent) -> bool {
        let Some(url) = self.config.url.as_deref() else {
            debug!(
                principal_id = %event.principal_id,
                "broadcast endpoint not configured; skipping revocation event"
            );
            return false;
        };

        let response = self
            .http_client
            .post(url)
            .timeout(self.config.timeout)
            .header("apikey", self.config.service_key.as_str())
            .bearer_auth(self.config.service_key.as_str())
            .json(&broadcast_message(event))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                debug!(
                    principal_id = %event.principal_id,
                    "published revocation event"
                );
                true
            }
            Ok(response) => {
                warn!(
                    principal_id = %event.principal_id,
                    status = %response.status(),
                    "broadcast endpoint rejected revocation event"
                );
                false
            }
            Err(error) => {
                warn!(
                    principal_id = %event.principal_id,
                    "failed to reach broadcast endpoint: {error}"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use staffgate_domain::{PrincipalId, RevocationEvent, RevokedAccessKind};

    use super::broadcast_message;

    #[test]
    fn message_wraps_event_on_the_access_control_channel() {
        let revoked_at = match Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single() {
            Some(at) => at,
            None => panic!("invalid timestamp"),
        };
        let event = RevocationEvent {
            principal_id: PrincipalId::from_i64(42),
            revoked_by: "admin".to_owned(),
            reason: Some("offboarding".to_owned()),
            revoked_at,
            kind: RevokedAccessKind::Grant,
        };

        let message = broadcast_message(&event);
        assert_eq!(message["channel"], "access_control");

        let inner: Value = match serde_json::from_str(
            message["payload"].as_str().unwrap_or_default(),
        ) {
            Ok(inner) => inner,
            Err(error) => panic!("payload is not a JSON string: {error}"),
        };
        assert_eq!(inner["event_type"], "ACCESS_REVOKED");
        assert_eq!(inner["payload"]["user_id"], 42);
        assert_eq!(inner["payload"]["access_type"], "access_grant");
        assert_eq!(inner["payload"]["revoked_at"], "2025-06-01T12:00:00+00:00");
    }

    #[test]
    fn absent_reason_serializes_as_null() {
        let event = RevocationEvent {
            principal_id: PrincipalId::from_i64(7),
            revoked_by: "admin".to_owned(),
            reason: None,
            revoked_at: Utc::now(),
            kind: RevokedAccessKind::PrincipalOnly,
        };

        let message = broadcast_message(&event);
        let inner: Value = match serde_json::from_str(
            message["payload"].as_str().unwrap_or_default(),
        ) {
            Ok(inner) => inner,
            Err(error) => panic!("payload is not a JSON string: {error}"),
        };
        assert!(inner["payload"]["revocation_reason"].is_null());
        assert_eq!(inner["payload"]["access_type"], "principal_only");
    }
}
