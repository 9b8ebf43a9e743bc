//! LINE Messaging API channel: webhook signature, webhook payload, and reply client.

mod client;
mod signature;
mod webhook;

pub use client::{LineApiError, LineClient, MessagingClient};
pub use signature::{compute_signature, verify_signature, SignatureError, SIGNATURE_HEADER};
pub use webhook::{parse_events, Message, WebhookBody, WebhookEvent};
