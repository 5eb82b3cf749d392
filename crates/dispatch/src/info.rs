//! Command invocation types

use player_roles_sdk::{CommandPath, CommandSource};

/// Result of command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum CommandResult {
    /// Command ran but could not do what was asked
    #[default]
    Failed = 0,
    /// Command ran successfully
    Handled = 1,
}

/// Information about a command invocation
pub struct CommandContext<'a, S> {
    /// Who is running the command
    source: &'a S,

    /// Parsed argument values by argument name, in input order
    args: Vec<(String, String)>,

    /// Full command string as typed
    raw_string: String,

    /// Path of the node whose executor is running
    path: CommandPath,
}

impl<'a, S: CommandSource> CommandContext<'a, S> {
    /// Create new CommandContext
    pub fn new(
        source: &'a S,
        args: Vec<(String, String)>,
        raw_string: String,
        path: CommandPath,
    ) -> Self {
        Self {
            source,
            args,
            raw_string,
            path,
        }
    }

    /// Get the source that ran the command
    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Get an argument value by argument name
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(arg_name, _)| arg_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get the number of parsed arguments
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Get all parsed arguments
    pub fn args(&self) -> &[(String, String)] {
        &self.args
    }

    /// Get the full raw command string
    pub fn get_command_string(&self) -> &str {
        &self.raw_string
    }

    /// Get the path of the executing node
    pub fn path(&self) -> &CommandPath {
        &self.path
    }

    /// Reply to the source
    pub fn reply(&self, message: &str) {
        self.source.send_feedback(message);
    }

    /// Reply with formatted message
    pub fn reply_fmt(&self, args: std::fmt::Arguments<'_>) {
        self.reply(&args.to_string());
    }
}

/// Type alias for command executor functions
pub type CommandCallback<S> =
    Box<dyn for<'a> Fn(&CommandContext<'a, S>) -> CommandResult + Send + Sync>;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use player_roles_sdk::PathSegment;

    use super::*;

    struct Console {
        lines: RefCell<Vec<String>>,
    }

    impl CommandSource for Console {
        fn user_id(&self) -> Option<u64> {
            None
        }

        fn send_feedback(&self, message: &str) {
            self.lines.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn test_command_context() {
        let console = Console {
            lines: RefCell::new(Vec::new()),
        };
        let path = CommandPath::literals(&["role", "list"]).child(PathSegment::argument("target"));
        let ctx = CommandContext::new(
            &console,
            vec![("target".to_string(), "Steve".to_string())],
            "role list Steve".to_string(),
            path.clone(),
        );

        assert_eq!(ctx.arg("target"), Some("Steve"));
        assert_eq!(ctx.arg("missing"), None);
        assert_eq!(ctx.arg_count(), 1);
        assert_eq!(ctx.get_command_string(), "role list Steve");
        assert_eq!(ctx.path(), &path);

        ctx.reply("hello");
        ctx.reply_fmt(format_args!("{} roles", 2));
        assert_eq!(*console.lines.borrow(), vec!["hello", "2 roles"]);
    }

    #[test]
    fn test_default_result() {
        assert_eq!(CommandResult::default(), CommandResult::Failed);
    }
}
