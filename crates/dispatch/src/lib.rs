//! In-memory Command Dispatcher
//!
//! A small tree-shaped command dispatcher implementing
//! [`CommandTree`](player_roles_sdk::CommandTree). Hosts that do not bring
//! their own dispatcher can use it directly; the role engine's tests use it as
//! the reference host.
//!
//! # Architecture
//!
//! ```text
//! input "role assign Steve admin"
//!   → root → literal "role" → literal "assign" → <target> → <role> → executor
//!            (each step checks the node's Requirement)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use player_roles_dispatch::{CommandDispatcher, CommandResult};
//!
//! let mut dispatcher = CommandDispatcher::new();
//! let root = dispatcher.root();
//! let ping = dispatcher.literal(root, "ping");
//! dispatcher.executes(ping, |ctx| {
//!     ctx.reply("Pong!");
//!     CommandResult::Handled
//! });
//!
//! dispatcher.execute(&source, "ping")?;
//! ```

mod dispatcher;
mod error;
mod info;

pub use dispatcher::{CommandDispatcher, CommandNodeKind};
pub use error::DispatchError;
pub use info::{CommandCallback, CommandContext, CommandResult};
