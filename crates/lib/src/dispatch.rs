//! Event dispatch: pick the canned reply for each webhook event and send it.
//!
//! Events are handled one at a time in delivery order. A failed API call is logged and
//! the batch continues; nothing here fails the webhook request.

use crate::channels::line::{LineApiError, Message, MessagingClient, WebhookEvent};

/// The only keyword the bot understands.
pub const RESERVATION_KEYWORD: &str = "予約";
/// Reply to the keyword.
pub const RESERVATION_ACCEPTED: &str = "予約します。";
/// Reply to any other text.
pub const RESERVATION_PROMPT: &str = "「予約」と入力してください。";
/// Reply to image, video, and audio messages.
pub const MEDIA_UNSUPPORTED: &str = "画像には対応していません。";

/// Per-process dispatch settings (from config).
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    /// Download media content before replying to image/video/audio messages.
    pub fetch_media_content: bool,
}

/// What happened to one event.
#[derive(Debug)]
pub enum DispatchOutcome {
    Replied,
    Skipped,
    Failed(LineApiError),
}

impl DispatchOutcome {
    pub fn is_replied(&self) -> bool {
        matches!(self, DispatchOutcome::Replied)
    }
}

/// Reply text for a message, or None when the message kind is not answered.
pub fn reply_text_for(message: &Message) -> Option<&'static str> {
    match message {
        Message::Text { text, .. } => {
            if text.trim() == RESERVATION_KEYWORD {
                Some(RESERVATION_ACCEPTED)
            } else {
                Some(RESERVATION_PROMPT)
            }
        }
        Message::Image { .. } | Message::Video { .. } | Message::Audio { .. } => {
            Some(MEDIA_UNSUPPORTED)
        }
        Message::Other => None,
    }
}

/// Handle one event: at most one reply call (plus the optional content download for media).
pub async fn dispatch_event(
    client: &dyn MessagingClient,
    event: &WebhookEvent,
    options: DispatchOptions,
) -> DispatchOutcome {
    let (reply_token, message) = match event {
        WebhookEvent::Message {
            reply_token,
            message,
        } => (reply_token, message),
        WebhookEvent::Other => {
            log::debug!("dispatch: ignoring non-message event");
            return DispatchOutcome::Skipped;
        }
    };
    let Some(text) = reply_text_for(message) else {
        log::debug!("dispatch: ignoring {} message", message.kind());
        return DispatchOutcome::Skipped;
    };
    let Some(reply_token) = reply_token.as_deref() else {
        log::debug!("dispatch: {} message without reply token", message.kind());
        return DispatchOutcome::Skipped;
    };
    log::debug!("dispatch: handling {} message", message.kind());

    if options.fetch_media_content {
        if let Some(id) = message.media_id() {
            match client.fetch_message_content(id).await {
                Ok(content) => {
                    log::debug!("dispatch: fetched {} bytes of {} content", content.len(), message.kind());
                }
                Err(e) => return DispatchOutcome::Failed(e),
            }
        }
    }

    match client.reply_text(reply_token, text).await {
        Ok(()) => DispatchOutcome::Replied,
        Err(e) => DispatchOutcome::Failed(e),
    }
}

/// Handle a batch sequentially. Failures are logged and do not stop later events.
pub async fn dispatch_events(
    client: &dyn MessagingClient,
    events: &[WebhookEvent],
    options: DispatchOptions,
) -> Vec<DispatchOutcome> {
    let mut outcomes = Vec::with_capacity(events.len());
    for event in events {
        let outcome = dispatch_event(client, event, options).await;
        if let DispatchOutcome::Failed(ref e) = outcome {
            log::warn!("dispatch: event not answered: {}", e);
        }
        outcomes.push(outcome);
    }
    outcomes
}
