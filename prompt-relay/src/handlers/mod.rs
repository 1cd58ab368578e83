//! HTTP handlers for the prompt relay.

pub mod health;
pub mod relay;

pub use health::health_check;
pub use relay::relay_prompt;
