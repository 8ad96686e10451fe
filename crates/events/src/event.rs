//! Event kinds, event construction, and the type-erased event capability set.
//!
//! An *event kind* is a plain `serde` record (the kind-specific fields, with
//! their defaults given by `Default`) plus a handful of associated constants
//! declaring where it lives: its context, its name, and the aggregate it is
//! about. [`Event<K>`] wraps a kind with the fields every event carries and is
//! the only way to build one.
//!
//! Events are:
//! - **immutable** (accessors only, no setters)
//! - **identified** (a fresh UUID v4 per construction)
//! - **timestamped** by the system, never by the caller

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use ripple_core::{ConstructionError, ConstructionResult, EventId};

/// Caller-supplied fields shared by every kind.
pub(crate) const COMMON_FIELDS: &[&str] = &["aggregate_id", "actor_id", "workspace_id", "metadata"];

/// Common fields that must be present on every construction.
const REQUIRED_COMMON_FIELDS: &[&str] = &["aggregate_id", "actor_id"];

/// Only accepted by user-scoped kinds.
pub(crate) const TARGET_USER_FIELD: &str = "target_user_id";

/// Generated at construction; callers may never supply these.
pub(crate) const RESERVED_FIELDS: &[&str] = &["event_id", "event_type", "occurred_at", "aggregate_type"];

/// `"<context>.<event_name>"`, both segments lower snake case.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType {
    context: &'static str,
    name: &'static str,
}

impl EventType {
    pub const fn new(context: &'static str, name: &'static str) -> Self {
        Self { context, name }
    }

    /// The business context the event belongs to (first segment).
    pub fn context(&self) -> &'static str {
        self.context
    }

    /// The event name within its context (second segment).
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.context, self.name)
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Declaration of an event kind.
///
/// The implementing type holds the kind-specific fields. Its `Default` value
/// supplies the declared defaults, and the keys of its serialized default are
/// the set of fields the kind accepts.
///
/// ```ignore
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// pub struct ProjectCreated {
///     pub name: String,
/// }
///
/// impl EventKind for ProjectCreated {
///     const CONTEXT: &'static str = "projects";
///     const EVENT_NAME: &'static str = "project_created";
///     const AGGREGATE_TYPE: &'static str = "project";
///     const REQUIRED_FIELDS: &'static [&'static str] = &["name"];
/// }
/// ```
pub trait EventKind:
    Serialize + DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static
{
    const CONTEXT: &'static str;
    const EVENT_NAME: &'static str;
    const AGGREGATE_TYPE: &'static str;

    /// Kind-specific fields that must be supplied at construction.
    const REQUIRED_FIELDS: &'static [&'static str] = &[];

    /// Whether events of this kind may target a single user's topic.
    const USER_SCOPED: bool = false;

    fn event_type() -> EventType {
        EventType::new(Self::CONTEXT, Self::EVENT_NAME)
    }

    fn aggregate_type() -> &'static str {
        Self::AGGREGATE_TYPE
    }
}

/// The capability set shared by every event, whatever its kind.
///
/// This is what subscribers see: the transport carries [`SharedEvent`]s and a
/// handler downcasts to a concrete [`Event<K>`] when it needs kind fields.
pub trait DomainEvent: fmt::Debug + Send + Sync + 'static {
    fn event_id(&self) -> EventId;

    fn event_type(&self) -> EventType;

    fn aggregate_type(&self) -> &'static str;

    fn aggregate_id(&self) -> &str;

    fn actor_id(&self) -> &str;

    /// `None` for global events.
    fn workspace_id(&self) -> Option<&str>;

    /// Always `None` for kinds that are not user scoped.
    fn target_user_id(&self) -> Option<&str>;

    fn occurred_at(&self) -> DateTime<Utc>;

    fn metadata(&self) -> &Map<String, Value>;

    /// Flat JSON rendering: common fields plus kind fields.
    fn to_json(&self) -> Value;

    fn as_any(&self) -> &dyn Any;
}

impl dyn DomainEvent {
    /// Recover the concrete event, e.g. `event.downcast_ref::<Event<ProjectCreated>>()`.
    pub fn downcast_ref<T: DomainEvent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: DomainEvent>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// An event as it travels on the transport: shared, immutable, unmodified.
pub type SharedEvent = Arc<dyn DomainEvent>;

/// A constructed domain event of kind `K`.
#[derive(Debug, Clone)]
pub struct Event<K> {
    event_id: EventId,
    occurred_at: DateTime<Utc>,
    aggregate_id: String,
    actor_id: String,
    workspace_id: Option<String>,
    target_user_id: Option<String>,
    metadata: Map<String, Value>,
    payload: K,
}

impl<K: EventKind> Event<K> {
    /// Build an event from a JSON object of attributes.
    ///
    /// `aggregate_id`, `actor_id` and every `K::REQUIRED_FIELDS` entry must be
    /// present and non-null. `workspace_id`, `metadata` and (for user-scoped
    /// kinds) `target_user_id` are optional. Supplied kind fields are merged
    /// over the kind's defaults.
    pub fn new(attrs: Value) -> ConstructionResult<Self> {
        let mut attrs = match attrs {
            Value::Object(map) => map,
            other => return Err(ConstructionError::NotAnObject(json_kind(&other).to_string())),
        };

        if let Some(field) = RESERVED_FIELDS.iter().find(|f| attrs.contains_key(**f)) {
            return Err(ConstructionError::ReservedField((*field).to_string()));
        }

        let defaults = declared_defaults::<K>()?;

        let unknown: Vec<String> = attrs
            .keys()
            .filter(|key| !Self::accepts(key, &defaults))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ConstructionError::UnknownFields(unknown));
        }

        let missing: Vec<&str> = REQUIRED_COMMON_FIELDS
            .iter()
            .chain(K::REQUIRED_FIELDS)
            .copied()
            .filter(|field| attrs.get(*field).is_none_or(Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(ConstructionError::missing(missing));
        }

        let aggregate_id = take_string(&mut attrs, "aggregate_id")?.unwrap_or_default();
        let actor_id = take_string(&mut attrs, "actor_id")?.unwrap_or_default();
        let workspace_id = take_string(&mut attrs, "workspace_id")?;
        let target_user_id = take_string(&mut attrs, TARGET_USER_FIELD)?;
        let metadata = match attrs.remove("metadata") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(ConstructionError::invalid(
                    "metadata",
                    format!("expected an object, got {}", json_kind(&other)),
                ));
            }
        };

        // Whatever is left are kind fields.
        let payload = if attrs.is_empty() && defaults.is_empty() {
            K::default()
        } else {
            build_payload::<K>(defaults, attrs)?
        };

        Ok(Self {
            event_id: EventId::new(),
            occurred_at: Utc::now(),
            aggregate_id,
            actor_id,
            workspace_id,
            target_user_id,
            metadata,
            payload,
        })
    }

    /// Kind-specific fields.
    pub fn payload(&self) -> &K {
        &self.payload
    }

    pub fn into_shared(self) -> SharedEvent {
        Arc::new(self)
    }

    fn accepts(key: &str, defaults: &Map<String, Value>) -> bool {
        COMMON_FIELDS.contains(&key)
            || (K::USER_SCOPED && key == TARGET_USER_FIELD)
            || defaults.contains_key(key)
    }
}

impl<K: EventKind> DomainEvent for Event<K> {
    fn event_id(&self) -> EventId {
        self.event_id
    }

    fn event_type(&self) -> EventType {
        K::event_type()
    }

    fn aggregate_type(&self) -> &'static str {
        K::AGGREGATE_TYPE
    }

    fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    fn actor_id(&self) -> &str {
        &self.actor_id
    }

    fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    fn target_user_id(&self) -> Option<&str> {
        self.target_user_id.as_deref()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    fn to_json(&self) -> Value {
        let mut out = match serde_json::to_value(&self.payload) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        out.insert("event_id".into(), Value::String(self.event_id.to_string()));
        out.insert("event_type".into(), Value::String(K::event_type().to_string()));
        out.insert("aggregate_type".into(), Value::String(K::AGGREGATE_TYPE.into()));
        out.insert("aggregate_id".into(), Value::String(self.aggregate_id.clone()));
        out.insert("actor_id".into(), Value::String(self.actor_id.clone()));
        out.insert("workspace_id".into(), optional_string(&self.workspace_id));
        if K::USER_SCOPED {
            out.insert(TARGET_USER_FIELD.into(), optional_string(&self.target_user_id));
        }
        out.insert(
            "occurred_at".into(),
            Value::String(self.occurred_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        out.insert("metadata".into(), Value::Object(self.metadata.clone()));

        Value::Object(out)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<K: EventKind> From<Event<K>> for SharedEvent {
    fn from(event: Event<K>) -> Self {
        Arc::new(event)
    }
}

/// Names of the kind-specific fields `K` declares.
pub(crate) fn declared_fields<K: EventKind>() -> Vec<String> {
    declared_defaults::<K>()
        .map(|defaults| defaults.keys().cloned().collect())
        .unwrap_or_default()
}

fn declared_defaults<K: EventKind>() -> ConstructionResult<Map<String, Value>> {
    match serde_json::to_value(K::default()) {
        Ok(Value::Object(map)) => Ok(map),
        // Unit-like kinds declare no fields.
        Ok(_) => Ok(Map::new()),
        Err(e) => Err(ConstructionError::InvalidPayload {
            event_type: K::event_type().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Deserialize the kind from `supplied` merged over `defaults`.
///
/// On failure the error names the first supplied field that does not
/// deserialize on its own over the defaults.
fn build_payload<K: EventKind>(
    defaults: Map<String, Value>,
    supplied: Map<String, Value>,
) -> ConstructionResult<K> {
    let mut merged = defaults.clone();
    merged.extend(supplied.clone());

    serde_json::from_value(Value::Object(merged)).map_err(|err| {
        let culprit = supplied.iter().find(|(key, value)| {
            let mut single = defaults.clone();
            single.insert((*key).clone(), (*value).clone());
            serde_json::from_value::<K>(Value::Object(single)).is_err()
        });

        match culprit {
            Some((field, _)) => ConstructionError::invalid(field.clone(), err.to_string()),
            None => ConstructionError::InvalidPayload {
                event_type: K::event_type().to_string(),
                reason: err.to_string(),
            },
        }
    })
}

fn take_string(attrs: &mut Map<String, Value>, field: &str) -> ConstructionResult<Option<String>> {
    match attrs.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ConstructionError::invalid(
            field,
            format!("expected a string, got {}", json_kind(&other)),
        )),
    }
}

fn optional_string(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::String)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
