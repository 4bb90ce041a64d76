//! Outbound delivery channels.
//!
//! Channel-specific adapters are pluggable behind [`DeliveryChannel`]. The
//! digest orchestrator owns selection and formatting; a channel only moves
//! pre-formatted text.

pub mod telegram;
pub mod traits;

pub use telegram::{TelegramChannel, escape_markdown_v2};
pub use traits::{Credentials, DeliveryChannel};
