//! # Core Domain Entities
//!
//! Defines the chat entities that flow through the event pipeline and the
//! delivery engine.
//!
//! ## Clusters
//!
//! - **Messages**: `Message`, `MessageId`, `MessageKind`, `Args`
//! - **Identity**: `UserIdentity`, `UserId`, `SubscriberId`
//! - **Replies**: `Response`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

use crate::time::Timestamp;

// =============================================================================
// CLUSTER A: MESSAGES
// =============================================================================

/// Auxiliary caller-supplied arguments, kept in insertion order.
pub type Args = Map<String, Value>;

/// Opaque, globally unique message identifier.
///
/// Doubles as the resumption cursor handed back by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a cursor string as sent by a client.
    pub fn parse(cursor: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(cursor).map(Self)
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Origin of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Posted by a chat participant.
    #[default]
    Chat,
    /// Emitted by the engine itself (e.g. the terminal shutdown notice).
    System,
}

/// A chat message.
///
/// Immutable once stored in history: filters only ever see clones.
/// Identity for cursor purposes is `id` alone, never content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (cursor token).
    pub id: MessageId,
    /// Chat or system message.
    #[serde(default)]
    pub kind: MessageKind,
    /// Message body.
    pub text: String,
    /// Authenticated author; `None` for anonymous posters and system notices.
    pub from: Option<UserIdentity>,
    /// Auxiliary arguments supplied with the post.
    #[serde(default)]
    pub args: Args,
    /// Creation time in milliseconds since the Unix epoch.
    pub date: Timestamp,
    /// Listener-owned annotations (flood flag, recipient, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl Message {
    /// Create a chat message with a freshly generated id.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        from: Option<UserIdentity>,
        args: Args,
        date: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::new(),
            kind: MessageKind::Chat,
            text: text.into(),
            from,
            args,
            date,
            meta: Map::new(),
        }
    }

    /// Create an engine-originated system message.
    #[must_use]
    pub fn system(text: impl Into<String>, date: Timestamp) -> Self {
        Self {
            kind: MessageKind::System,
            ..Self::new(text, None, Args::new(), date)
        }
    }

    /// Returns true for engine-originated messages.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }

    /// Reads a boolean annotation, treating anything else as `false`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.meta.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Reads a string annotation.
    #[must_use]
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    /// Sets an annotation, replacing any previous value.
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Stable key of the author, if any.
    #[must_use]
    pub fn author_id(&self) -> Option<&UserId> {
        self.from.as_ref().map(|user| &user.id)
    }
}

// =============================================================================
// CLUSTER B: IDENTITY
// =============================================================================

/// Stable user key, usable in maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Borrow the raw key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chat participant as resolved by the transport adapter.
///
/// The engine only relies on `id`; the other attributes belong to
/// listeners (direct messaging, flood control, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable key.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Remote address, when known.
    #[serde(default)]
    pub ip: Option<IpAddr>,
    /// Registered account (as opposed to a guest nickname).
    #[serde(default)]
    pub has_account: bool,
}

impl UserIdentity {
    /// Create a guest identity keyed by its name.
    #[must_use]
    pub fn guest(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: UserId(name.clone()),
            name,
            ip: None,
            has_account: false,
        }
    }

    /// Create an identity backed by an account id.
    #[must_use]
    pub fn account(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ip: None,
            has_account: true,
        }
    }

    /// Attach the remote address.
    #[must_use]
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// True when `candidate` names this user by id or display name.
    #[must_use]
    pub fn answers_to(&self, candidate: &str) -> bool {
        self.id.as_str() == candidate || self.name == candidate
    }
}

/// Registry-assigned identity of a waiting subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// =============================================================================
// CLUSTER C: REPLIES
// =============================================================================

/// Reply accumulator returned to the poster of a message.
///
/// Listeners write entries while the message is being processed
/// (e.g. `flood`, `direct`, the output of a console command).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Response(Map<String, Value>);

impl Response {
    /// Create an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no listener wrote anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
