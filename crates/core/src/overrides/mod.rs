//! Role override types
//!
//! An override type is a named, typed slot a role may carry a value for.
//! This module provides the [`OverrideRegistry`] where types are declared and
//! the value types of the built-in overrides.
//!
//! # Built-in value types
//!
//! | Type | Config form |
//! |------|-------------|
//! | [`ChatFormat`] | `"[{name}] {message}"` |
//! | [`NameStyle`] | `{ color = "red", styles = ["bold"] }` |
//! | [`PermissionLevel`] | integer `0..=4` |
//! | [`PermissionKeyOverride`] | `{ "@css/ban" = "allow", "@fun/*" = "deny" }` |
//!
//! Command permissions live in [`crate::commands`].

mod chat;
mod keys;
mod level;
mod name;
mod registry;

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

pub use chat::ChatFormat;
pub use keys::{check_permission, extract_domain, PermissionKeyOverride, PERMISSION_PREFIX};
pub use level::PermissionLevel;
pub use name::{NameStyle, TextStyle};
pub use registry::{
    ChangeListener, OverrideKey, OverrideRegistry, OverrideType, OverrideValue, RegistryError,
};

/// Map entries in the order they were written
///
/// Used by overrides whose semantics depend on declaration order.
pub(crate) struct OrderedEntries<V>(pub Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of keys to decisions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
