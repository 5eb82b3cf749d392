//! Command source trait
//!
//! The role engine never sees host player objects directly. A source only has
//! to say which user (if any) it acts for, and how to talk back to it.

/// Whoever is running or completing a command
pub trait CommandSource {
    /// The user this source acts for, or `None` for the server console and
    /// other non-player sources
    fn user_id(&self) -> Option<u64>;

    /// Host-defined permission level (0 = regular player, 4 = full operator)
    fn permission_level(&self) -> u8 {
        0
    }

    /// Name shown in feedback messages
    fn display_name(&self) -> String {
        match self.user_id() {
            Some(id) => id.to_string(),
            None => "Server".to_string(),
        }
    }

    /// Send a feedback line back to the source
    fn send_feedback(&self, message: &str);
}
