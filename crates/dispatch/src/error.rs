//! Error types for command dispatch

/// Error type for dispatching a command string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No visible node matches the input (unknown, or hidden by a requirement)
    #[error("Unknown or incomplete command: {0}")]
    UnknownCommand(String),

    /// Input stopped at a node that has no executor
    #[error("Incomplete command: {0}")]
    Incomplete(String),

    /// Input was empty
    #[error("Empty command")]
    Empty,
}
