//! Test doubles for the host

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use player_roles_sdk::CommandSource;

use crate::host::RolesHost;

#[derive(Default)]
pub struct MockHost {
    pub names: HashMap<String, u64>,
    pub resent: Mutex<Vec<u64>>,
    pub messages: Mutex<Vec<(u64, String)>>,
}

impl MockHost {
    pub fn with_users(users: &[(&str, u64)]) -> Self {
        Self {
            names: users.iter().map(|(n, id)| (n.to_string(), *id)).collect(),
            ..Self::default()
        }
    }
}

impl RolesHost for MockHost {
    fn resend_command_tree(&self, user: u64) {
        self.resent.lock().push(user);
    }

    fn find_user(&self, name: &str) -> Option<u64> {
        self.names.get(name).copied()
    }

    fn online_users(&self) -> Vec<u64> {
        self.names.values().copied().collect()
    }

    fn send_message(&self, user: u64, message: &str) {
        self.messages.lock().push((user, message.to_string()));
    }
}

/// Collects formatted log output
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Player {
    pub id: Option<u64>,
    pub level: u8,
    pub feedback: Mutex<Vec<String>>,
}

impl Player {
    pub fn user(id: u64, level: u8) -> Self {
        Self {
            id: Some(id),
            level,
            feedback: Mutex::new(Vec::new()),
        }
    }

    pub fn console() -> Self {
        Self {
            id: None,
            level: 4,
            feedback: Mutex::new(Vec::new()),
        }
    }

    pub fn last_feedback(&self) -> Option<String> {
        self.feedback.lock().last().cloned()
    }
}

impl CommandSource for Player {
    fn user_id(&self) -> Option<u64> {
        self.id
    }

    fn permission_level(&self) -> u8 {
        self.level
    }

    fn send_feedback(&self, message: &str) {
        self.feedback.lock().push(message.to_string());
    }
}
