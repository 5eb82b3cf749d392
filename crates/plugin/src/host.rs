//! Host callbacks

/// Services the host provides to the role system
pub trait RolesHost: Send + Sync {
    /// Send the user a fresh copy of their command tree
    ///
    /// Called when a change may have altered which commands the user sees.
    fn resend_command_tree(&self, user: u64);

    /// Find an online user by name
    fn find_user(&self, name: &str) -> Option<u64>;

    /// Users currently online
    fn online_users(&self) -> Vec<u64>;

    /// Send a system message to a user
    fn send_message(&self, user: u64, message: &str);
}
