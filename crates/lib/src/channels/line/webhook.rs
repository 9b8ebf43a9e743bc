//! LINE webhook payload (POST body of the callback route).
//!
//! Only the fields the dispatcher needs are modelled; everything else in the
//! payload is ignored. Event and message kinds we don't answer collapse into `Other`.

use serde::Deserialize;

/// Webhook request body: the bot's user id and a batch of events.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One webhook event, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    /// A user sent a message. `reply_token` is absent for events delivered in standby mode.
    #[serde(rename_all = "camelCase")]
    Message {
        #[serde(default)]
        reply_token: Option<String>,
        message: Message,
    },
    /// follow, unfollow, join, postback, ...
    #[serde(other)]
    Other,
}

/// Message payload of a message event, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text { id: String, text: String },
    Image { id: String },
    Video { id: String },
    Audio { id: String },
    /// sticker, location, file, ...
    #[serde(other)]
    Other,
}

impl Message {
    /// Content id for media messages (image, video, audio).
    pub fn media_id(&self) -> Option<&str> {
        match self {
            Message::Image { id } | Message::Video { id } | Message::Audio { id } => Some(id),
            Message::Text { .. } | Message::Other => None,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Text { .. } => "text",
            Message::Image { .. } => "image",
            Message::Video { .. } => "video",
            Message::Audio { .. } => "audio",
            Message::Other => "other",
        }
    }
}

/// Parse a webhook body into its events, in delivery order.
pub fn parse_events(body: &[u8]) -> Result<Vec<WebhookEvent>, serde_json::Error> {
    let body: WebhookBody = serde_json::from_slice(body)?;
    Ok(body.events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "destination": "Uxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
        "events": [
            {
                "type": "message",
                "message": { "type": "text", "id": "14353798921116", "text": "予約" },
                "webhookEventId": "01FZ74A0TDDPYRVKNK77XKC3ZR",
                "deliveryContext": { "isRedelivery": false },
                "timestamp": 1625665242211,
                "source": { "type": "user", "userId": "U80696558e1aa831..." },
                "replyToken": "757913772c4646b784d4b7ce46d12671",
                "mode": "active"
            },
            {
                "type": "message",
                "message": {
                    "type": "image",
                    "id": "354718705033693859",
                    "contentProvider": { "type": "line" }
                },
                "replyToken": "fbf94e269485410da6b7e3a5e33283e8",
                "mode": "active"
            },
            {
                "type": "follow",
                "replyToken": "bb173f4d9cf64aed9d408ab4e36339ad",
                "source": { "type": "user", "userId": "U4af4980629..." },
                "mode": "active"
            },
            {
                "type": "message",
                "message": { "type": "sticker", "id": "1", "packageId": "446", "stickerId": "1988" },
                "replyToken": "aa",
                "mode": "active"
            }
        ]
    }"#;

    #[test]
    fn parses_mixed_batch_in_order() {
        let events = parse_events(SAMPLE.as_bytes()).expect("parse sample");
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            WebhookEvent::Message {
                reply_token: Some("757913772c4646b784d4b7ce46d12671".to_string()),
                message: Message::Text {
                    id: "14353798921116".to_string(),
                    text: "予約".to_string(),
                },
            }
        );
        match &events[1] {
            WebhookEvent::Message { message, .. } => {
                assert_eq!(message.kind(), "image");
                assert_eq!(message.media_id(), Some("354718705033693859"));
            }
            other => panic!("expected image message, got {:?}", other),
        }
        assert_eq!(events[2], WebhookEvent::Other);
        match &events[3] {
            WebhookEvent::Message { message, .. } => assert_eq!(*message, Message::Other),
            other => panic!("expected message event, got {:?}", other),
        }
    }

    #[test]
    fn verify_request_has_no_events() {
        let events = parse_events(br#"{"destination":"U1","events":[]}"#).expect("parse");
        assert!(events.is_empty());
    }

    #[test]
    fn standby_message_has_no_reply_token() {
        let events = parse_events(
            br#"{"events":[{"type":"message","mode":"standby","message":{"type":"audio","id":"9"}}]}"#,
        )
        .expect("parse");
        assert_eq!(
            events[0],
            WebhookEvent::Message {
                reply_token: None,
                message: Message::Audio { id: "9".to_string() },
            }
        );
    }

    #[test]
    fn rejects_non_webhook_body() {
        assert!(parse_events(b"").is_err());
        assert!(parse_events(b"\"hello\"").is_err());
    }
}
