//! Host-facing command contract, router, and stdio transport.

pub mod channel;
pub mod contract;
pub mod handler;
pub mod stdio;

pub use channel::{HostCommandClient, HostCommandServer, command_channel};
pub use contract::{CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope};
pub use handler::CommandRouter;
pub use stdio::{run_bridge, run_stdio_bridge};
