//! The seam to the persistence layer's native lifecycle mechanism.

use crate::entity::Entity;
use crate::error::{HookError, HookResult};
use crate::event::EventKind;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Callback the installer hands to a lifecycle source.
///
/// The source must invoke it once per native firing of the kind it was
/// attached for, passing the affected instance.
#[async_trait]
pub trait LifecycleListener: Send + Sync {
    /// A native lifecycle event fired for `instance`.
    async fn on_event(&self, instance: Arc<dyn Entity>);
}

/// A persistence layer able to report lifecycle events.
///
/// The registry attaches at most one listener per (entity type, event
/// kind), no matter how many hooks are registered behind it. Attachment
/// happens during registration; a source that cannot support a kind for a
/// type must reject it there, which aborts that registration.
pub trait LifecycleSource: Send + Sync {
    /// Attach a listener for `kind` on `entity_type`.
    fn attach(
        &self,
        entity_type: &str,
        kind: EventKind,
        listener: Arc<dyn LifecycleListener>,
    ) -> HookResult<()>;
}

/// In-process lifecycle source.
///
/// Stands in for a real persistence layer: callers report persistence
/// operations through [`emit`](MemorySource::emit) or the `persist_*`
/// helpers and attached listeners are invoked synchronously, in attachment
/// order. Kinds can be marked unsupported to model an entity lifecycle
/// that lacks them.
#[derive(Clone, Default)]
pub struct MemorySource {
    listeners: Arc<DashMap<(String, EventKind), Vec<Arc<dyn LifecycleListener>>>>,
    unsupported: HashSet<EventKind>,
}

impl MemorySource {
    /// Create a source supporting every event kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a kind as unsupported; attaching for it will be rejected.
    pub fn without_kind(mut self, kind: EventKind) -> Self {
        self.unsupported.insert(kind);
        self
    }

    /// Number of listeners attached for (entity type, kind).
    pub fn listener_count(&self, entity_type: &str, kind: EventKind) -> usize {
        self.listeners
            .get(&(entity_type.to_string(), kind))
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    /// Report a single native lifecycle firing.
    pub async fn emit(&self, kind: EventKind, instance: Arc<dyn Entity>) {
        let key = (instance.entity_type().to_string(), kind);
        let listeners: Vec<_> = self
            .listeners
            .get(&key)
            .map(|listeners| listeners.value().clone())
            .unwrap_or_default();

        for listener in listeners {
            listener.on_event(instance.clone()).await;
        }
    }

    /// Report the firings of persisting a new instance: `Create`, then
    /// `Save`, then `Commit`, each an independent firing.
    pub async fn persist_new(&self, instance: Arc<dyn Entity>) {
        for kind in [EventKind::Create, EventKind::Save, EventKind::Commit] {
            self.emit(kind, instance.clone()).await;
        }
    }

    /// Report the firings of persisting changes to an existing instance:
    /// `Update`, then `Save`, then `Commit`.
    pub async fn persist_update(&self, instance: Arc<dyn Entity>) {
        for kind in [EventKind::Update, EventKind::Save, EventKind::Commit] {
            self.emit(kind, instance.clone()).await;
        }
    }
}

impl LifecycleSource for MemorySource {
    fn attach(
        &self,
        entity_type: &str,
        kind: EventKind,
        listener: Arc<dyn LifecycleListener>,
    ) -> HookResult<()> {
        if self.unsupported.contains(&kind) {
            return Err(HookError::InstallRejected {
                entity_type: entity_type.to_string(),
                kind,
                reason: "event kind not supported by this source".to_string(),
            });
        }

        self.listeners
            .entry((entity_type.to_string(), kind))
            .or_default()
            .push(listener);
        Ok(())
    }
}
