//! yoyaku core library: config, LINE channel, event dispatch, and the webhook
//! gateway used by the `yoyaku` binary.

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod gateway;
