//! Override type registry
//!
//! Every kind of value a role may carry is declared here once, at startup,
//! with a serde codec and an optional change listener. After initialization
//! the registry is frozen and only read.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle for a registered override type
    pub struct OverrideKey;
}

/// Type-erased override value as stored on a role
pub type OverrideValue = Arc<dyn Any + Send + Sync>;

/// Callback invoked with a user id when that user's resolved value may have changed
pub type ChangeListener = Arc<dyn Fn(u64) + Send + Sync>;

type DecodeFn = fn(serde_json::Value) -> Result<OverrideValue, serde_json::Error>;
type EncodeFn = fn(&OverrideValue) -> Option<Result<serde_json::Value, serde_json::Error>>;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// An override type with this identifier already exists
    #[error("Override type '{0}' is already registered")]
    Duplicate(String),

    /// The registry was frozen at the end of initialization
    #[error("Cannot register override type '{0}': registry is frozen")]
    Frozen(String),
}

/// Typed handle for an override type
///
/// Cheap to clone; used to read values of type `V` from roles.
pub struct OverrideType<V> {
    key: OverrideKey,
    id: Arc<str>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> OverrideType<V> {
    pub fn key(&self) -> OverrideKey {
        self.key
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<V> Clone for OverrideType<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            id: Arc::clone(&self.id),
            _marker: PhantomData,
        }
    }
}

impl<V> fmt::Debug for OverrideType<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideType")
            .field("id", &self.id)
            .finish()
    }
}

/// Registered override type information
struct OverrideEntry {
    id: Arc<str>,
    decode: DecodeFn,
    encode: EncodeFn,
    listener: Option<ChangeListener>,
}

struct RegistryInner {
    entries: SlotMap<OverrideKey, OverrideEntry>,
    by_id: HashMap<Arc<str>, OverrideKey>,
    frozen: bool,
}

/// Registry of override types
pub struct OverrideRegistry {
    inner: RwLock<RegistryInner>,
}

fn decode_value<V>(value: serde_json::Value) -> Result<OverrideValue, serde_json::Error>
where
    V: DeserializeOwned + Send + Sync + 'static,
{
    let decoded: V = serde_json::from_value(value)?;
    Ok(Arc::new(decoded))
}

fn encode_value<V>(value: &OverrideValue) -> Option<Result<serde_json::Value, serde_json::Error>>
where
    V: Serialize + Send + Sync + 'static,
{
    value.downcast_ref::<V>().map(serde_json::to_value)
}

impl Default for OverrideRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                entries: SlotMap::with_key(),
                by_id: HashMap::new(),
                frozen: false,
            }),
        }
    }

    /// Register an override type without a change listener
    ///
    /// # Example
    /// ```ignore
    /// let mute: OverrideType<bool> = registry.register("mute")?;
    /// ```
    pub fn register<V>(&self, id: &str) -> Result<OverrideType<V>, RegistryError>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.insert::<V>(id, None)
    }

    /// Register an override type with a change listener
    ///
    /// The listener runs synchronously on the thread that changed the
    /// assignment or reloaded the roles. Panics inside it are caught and logged.
    pub fn register_with_listener<V, F>(
        &self,
        id: &str,
        listener: F,
    ) -> Result<OverrideType<V>, RegistryError>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.insert::<V>(id, Some(Arc::new(listener)))
    }

    fn insert<V>(
        &self,
        id: &str,
        listener: Option<ChangeListener>,
    ) -> Result<OverrideType<V>, RegistryError>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();

        if inner.frozen {
            return Err(RegistryError::Frozen(id.to_string()));
        }
        if inner.by_id.contains_key(id) {
            return Err(RegistryError::Duplicate(id.to_string()));
        }

        let id: Arc<str> = Arc::from(id);
        let key = inner.entries.insert(OverrideEntry {
            id: Arc::clone(&id),
            decode: decode_value::<V>,
            encode: encode_value::<V>,
            listener,
        });
        inner.by_id.insert(Arc::clone(&id), key);

        tracing::debug!("Registered override type: {}", id);
        Ok(OverrideType {
            key,
            id,
            _marker: PhantomData,
        })
    }

    /// Stop accepting registrations
    pub fn freeze(&self) {
        self.inner.write().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.read().frozen
    }

    /// Find an override type by identifier
    pub fn lookup(&self, id: &str) -> Option<OverrideKey> {
        self.inner.read().by_id.get(id).copied()
    }

    /// Get the identifier of an override type
    pub fn id_of(&self, key: OverrideKey) -> Option<Arc<str>> {
        self.inner.read().entries.get(key).map(|e| Arc::clone(&e.id))
    }

    /// Decode a raw config value with the type's codec
    ///
    /// Returns `None` if the key is unknown.
    pub fn decode(
        &self,
        key: OverrideKey,
        value: serde_json::Value,
    ) -> Option<Result<OverrideValue, serde_json::Error>> {
        let decode = self.inner.read().entries.get(key)?.decode;
        Some(decode(value))
    }

    /// Encode a stored value back into its config form
    ///
    /// Returns `None` if the key is unknown or the value has a different type.
    pub fn encode(
        &self,
        key: OverrideKey,
        value: &OverrideValue,
    ) -> Option<Result<serde_json::Value, serde_json::Error>> {
        let encode = self.inner.read().entries.get(key)?.encode;
        encode(value)
    }

    /// Invoke the change listener of `key` for `user`, if one is registered
    pub fn notify(&self, key: OverrideKey, user: u64) {
        let (id, listener) = {
            let inner = self.inner.read();
            let Some(entry) = inner.entries.get(key) else {
                return;
            };
            (Arc::clone(&entry.id), entry.listener.clone())
        };

        let Some(listener) = listener else {
            return;
        };

        if catch_unwind(AssertUnwindSafe(|| listener(user))).is_err() {
            tracing::error!("Change listener for override '{}' panicked (user {})", id, user);
        }
    }

    /// Get the number of registered override types
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Check if no override types are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
