use super::model::InvalidJob;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

/// Push-subscription envelope delivered to the ingress endpoint.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PushEnvelope {
    pub message: PushMessage,
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// Base64 of a JSON [`VideoNotification`].
    pub data: Option<String>,
    pub message_id: Option<String>,
}

/// Object notification naming the raw video that landed in the bucket.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct VideoNotification {
    pub name: Option<String>,
}

pub fn decode_push_envelope(body: &[u8]) -> Result<VideoNotification, InvalidJob> {
    let envelope: PushEnvelope = serde_json::from_slice(body)
        .map_err(|e| InvalidJob::MalformedEnvelope(e.to_string()))?;

    debug!(
        message_id = envelope.message.message_id.as_deref().unwrap_or("-"),
        subscription = envelope.subscription.as_deref().unwrap_or("-"),
        "Decoded push envelope"
    );

    let data = envelope.message.data.ok_or(InvalidJob::MissingName)?;
    let payload = STANDARD
        .decode(data.trim())
        .map_err(|e| InvalidJob::MalformedEnvelope(format!("message data is not base64: {}", e)))?;

    decode_notification(&payload)
}

pub fn decode_notification(payload: &[u8]) -> Result<VideoNotification, InvalidJob> {
    serde_json::from_slice(payload).map_err(|e| InvalidJob::MalformedEnvelope(e.to_string()))
}

#[cfg(test)]
pub fn encode_push_envelope(notification: &serde_json::Value) -> Vec<u8> {
    let data = STANDARD.encode(notification.to_string());
    serde_json::json!({
        "message": { "data": data, "messageId": "136969346945" },
        "subscription": "projects/demo/subscriptions/video-uploads"
    })
    .to_string()
    .into_bytes()
}
