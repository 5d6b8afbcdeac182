//! Discord adapter - REST implementation of the `ChatPlatform` port.

mod rest_platform;
mod wire;

pub use rest_platform::DiscordRestPlatform;
