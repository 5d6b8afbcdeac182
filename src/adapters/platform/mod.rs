//! Test doubles for the `ChatPlatform` port.

mod mock_platform;

pub use mock_platform::{MethodCall, MockChatPlatform, MOCK_BOT_USER_ID};
