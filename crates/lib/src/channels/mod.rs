//! Communication channels.
//!
//! LINE is the only channel: webhook events come in through the gateway's
//! `/callback` route and replies go out through [`line::MessagingClient`].

pub mod line;
