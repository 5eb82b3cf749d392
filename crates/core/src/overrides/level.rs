//! Numeric permission level override value

use serde::{Deserialize, Serialize};

/// Host permission level granted by a role, in `0..=4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PermissionLevel(u8);

impl PermissionLevel {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 4;

    pub fn new(level: u8) -> Option<Self> {
        (level <= Self::MAX).then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for PermissionLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| {
                format!(
                    "permission level {} out of range {}..={}",
                    value,
                    Self::MIN,
                    Self::MAX
                )
            })
    }
}

impl From<PermissionLevel> for i64 {
    fn from(value: PermissionLevel) -> Self {
        i64::from(value.0)
    }
}
