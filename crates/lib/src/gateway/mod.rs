//! Gateway: the HTTP surface of the bot.
//!
//! `GET /` is a liveness placeholder; `POST /callback` is the LINE webhook
//! (signature check, parse, dispatch, always `OK` once the signature holds).

mod server;

pub use server::{router, run_gateway, GatewayState};
