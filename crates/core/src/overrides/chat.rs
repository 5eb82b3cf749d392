//! Chat format override value

use serde::{Deserialize, Serialize};

const NAME_PLACEHOLDER: &str = "{name}";
const MESSAGE_PLACEHOLDER: &str = "{message}";

/// Template applied to a user's chat messages
///
/// `{name}` is replaced by the sender's display name and `{message}` by the
/// message text. The template must contain `{message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChatFormat {
    template: String,
}

impl ChatFormat {
    pub fn new(template: impl Into<String>) -> Result<Self, String> {
        let template = template.into();
        if !template.contains(MESSAGE_PLACEHOLDER) {
            return Err(format!(
                "chat format '{}' must contain {}",
                template, MESSAGE_PLACEHOLDER
            ));
        }
        Ok(Self { template })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render a message
    ///
    /// The message is inserted verbatim, so placeholders typed by the user are
    /// never expanded.
    pub fn format(&self, name: &str, message: &str) -> String {
        self.template
            .split(MESSAGE_PLACEHOLDER)
            .map(|part| part.replace(NAME_PLACEHOLDER, name))
            .collect::<Vec<_>>()
            .join(message)
    }
}

impl TryFrom<String> for ChatFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChatFormat> for String {
    fn from(value: ChatFormat) -> Self {
        value.template
    }
}
