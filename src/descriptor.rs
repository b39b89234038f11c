//! Hook descriptors: target, guard, and message options.

use crate::entity::Entity;
use crate::error::HookResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Callback signature for inline hook targets.
pub type HookCallback = dyn Fn(&dyn Entity) -> HookResult<()> + Send + Sync;

/// What a hook invokes when it fires.
///
/// Targets are an explicit tagged variant, chosen at registration time;
/// nothing is inferred from argument shape. Named targets are recorded
/// unresolved and looked up on the receiver at fire time.
#[derive(Clone)]
pub enum HookTarget {
    /// Named method invoked on the re-acquired instance
    Method(String),
    /// Named method invoked at the entity-type (static) level
    ClassMethod(String),
    /// Inline callback taking the instance
    Callback(Arc<HookCallback>),
}

impl HookTarget {
    /// Instance-level method target.
    pub fn method(name: impl Into<String>) -> Self {
        HookTarget::Method(name.into())
    }

    /// Class-level (static) method target.
    pub fn class_method(name: impl Into<String>) -> Self {
        HookTarget::ClassMethod(name.into())
    }

    /// Inline callback target.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&dyn Entity) -> HookResult<()> + Send + Sync + 'static,
    {
        HookTarget::Callback(Arc::new(f))
    }

    /// Display name of the target.
    pub fn name(&self) -> &str {
        match self {
            HookTarget::Method(name) | HookTarget::ClassMethod(name) => name,
            HookTarget::Callback(_) => "<callback>",
        }
    }

    /// Whether the target is invoked at the entity-type level rather than
    /// on the instance.
    pub fn is_class_level(&self) -> bool {
        matches!(self, HookTarget::ClassMethod(_))
    }

    /// The method name to resolve on the receiver, if the target is named.
    pub fn method_name(&self) -> Option<&str> {
        match self {
            HookTarget::Method(name) | HookTarget::ClassMethod(name) => Some(name),
            HookTarget::Callback(_) => None,
        }
    }
}

impl fmt::Debug for HookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookTarget::Method(name) => write!(f, "Method({name:?})"),
            HookTarget::ClassMethod(name) => write!(f, "ClassMethod({name:?})"),
            HookTarget::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Conditional controlling whether a hook fires for a given instance.
///
/// The predicate name is evaluated through [`Entity::predicate`] at fire
/// time. A hook with no guard fires unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Fire only when the predicate is true
    If(String),
    /// Fire only when the predicate is false
    Unless(String),
}

impl Guard {
    /// Guard that permits firing when the predicate holds.
    pub fn if_(predicate: impl Into<String>) -> Self {
        Guard::If(predicate.into())
    }

    /// Guard that permits firing when the predicate does not hold.
    pub fn unless(predicate: impl Into<String>) -> Self {
        Guard::Unless(predicate.into())
    }

    /// The predicate name this guard evaluates.
    pub fn predicate(&self) -> &str {
        match self {
            Guard::If(name) | Guard::Unless(name) => name,
        }
    }

    /// Whether a predicate result permits firing.
    pub fn permits(&self, value: bool) -> bool {
        match self {
            Guard::If(_) => value,
            Guard::Unless(_) => !value,
        }
    }
}

/// Transport options forwarded verbatim with each dispatch.
///
/// The registry treats the contents as opaque; well-known keys like
/// `delay` and `priority` have builder helpers but nothing validates them
/// here. Each dispatch receives its own copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageOptions(BTreeMap<String, Value>);

impl MessageOptions {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Delay delivery by the given number of seconds.
    pub fn with_delay(self, seconds: u64) -> Self {
        self.with("delay", seconds)
    }

    /// Set delivery priority.
    pub fn with_priority(self, priority: i64) -> Self {
        self.with("priority", priority)
    }

    /// Route to a named queue.
    pub fn with_queue(self, queue: impl Into<String>) -> Self {
        self.with("queue", queue.into())
    }

    /// Look up an option value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether any options are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of options set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the options.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// One registered response to one lifecycle event kind for one entity type.
///
/// Descriptors are immutable once built: the registry appends them, hands
/// out clones, and drops whole lists under skip operations, but never edits
/// one in place.
#[derive(Debug, Clone)]
pub struct HookDescriptor {
    target: HookTarget,
    guard: Option<Guard>,
    message_options: MessageOptions,
}

impl HookDescriptor {
    /// Descriptor for an explicit target.
    pub fn new(target: HookTarget) -> Self {
        Self {
            target,
            guard: None,
            message_options: MessageOptions::new(),
        }
    }

    /// Descriptor for a named instance method.
    pub fn method(name: impl Into<String>) -> Self {
        Self::new(HookTarget::method(name))
    }

    /// Descriptor for a named class-level method.
    pub fn class_method(name: impl Into<String>) -> Self {
        Self::new(HookTarget::class_method(name))
    }

    /// Descriptor for an inline callback.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&dyn Entity) -> HookResult<()> + Send + Sync + 'static,
    {
        Self::new(HookTarget::callback(f))
    }

    /// Attach a guard.
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Attach message options.
    pub fn with_message_options(mut self, options: MessageOptions) -> Self {
        self.message_options = options;
        self
    }

    /// The target this descriptor invokes.
    pub fn target(&self) -> &HookTarget {
        &self.target
    }

    /// The guard, if any.
    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    /// The options forwarded with each dispatch.
    pub fn message_options(&self) -> &MessageOptions {
        &self.message_options
    }
}
