//! Fan-out of one native lifecycle firing to every eligible hook.

use crate::descriptor::Guard;
use crate::entity::Entity;
use crate::error::{HookError, HookResult};
use crate::event::EventKind;
use crate::registry::FanoutCore;
use crate::source::LifecycleListener;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

/// What one fan-out did.
///
/// Errors are collected per descriptor and never stop the fan-out; a
/// misconfigured or failing hook must not suppress its siblings, and the
/// persistence operation that triggered the firing is never affected.
#[derive(Debug, Default)]
pub struct FireOutcome {
    /// Hooks handed off to the dispatch bridge
    pub dispatched: usize,

    /// Hooks whose guard declined
    pub skipped: usize,

    /// Per-descriptor failures, in encounter order
    pub errors: Vec<HookError>,
}

impl FireOutcome {
    /// Whether every eligible hook dispatched cleanly.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The single native listener installed per (entity type, event kind).
///
/// Its only job is to invoke the fan-out; all handler management stays in
/// the registry tables it shares.
pub(crate) struct FanoutListener {
    core: Arc<FanoutCore>,
    entity_type: String,
    kind: EventKind,
}

impl FanoutListener {
    pub(crate) fn new(core: Arc<FanoutCore>, entity_type: String, kind: EventKind) -> Self {
        Self {
            core,
            entity_type,
            kind,
        }
    }
}

#[async_trait]
impl LifecycleListener for FanoutListener {
    async fn on_event(&self, instance: Arc<dyn Entity>) {
        let outcome = run(&self.core, &self.entity_type, self.kind, &instance).await;

        if self.core.config.enable_logging && !outcome.is_clean() {
            error!(
                "{} hook failure(s) during {}/{} fan-out",
                outcome.errors.len(),
                self.entity_type,
                self.kind
            );
        }
    }
}

/// Deliver one firing to each registered descriptor, in registration
/// order.
pub(crate) async fn run(
    core: &FanoutCore,
    entity_type: &str,
    kind: EventKind,
    instance: &Arc<dyn Entity>,
) -> FireOutcome {
    // Snapshot under the table lock, dispatch outside it.
    let descriptors = core
        .tables
        .get(entity_type)
        .and_then(|table| table.handlers.get(&kind).cloned())
        .unwrap_or_default();

    let mut outcome = FireOutcome::default();

    if descriptors.is_empty() {
        if core.config.enable_logging {
            debug!("No hooks registered for {}/{}", entity_type, kind);
        }
        return outcome;
    }

    for descriptor in &descriptors {
        match eligible(descriptor.guard(), instance.as_ref()) {
            Ok(true) => {}
            Ok(false) => {
                outcome.skipped += 1;
                continue;
            }
            Err(e) => {
                if core.config.enable_logging {
                    error!("Guard evaluation failed for {}/{}: {}", entity_type, kind, e);
                }
                outcome.errors.push(e);
                continue;
            }
        }

        if core.config.verify_targets {
            if let Some(name) = descriptor.target().method_name() {
                if !instance.resolves_method(name) {
                    if core.config.enable_logging {
                        error!("Unknown hook target {} on {}", name, entity_type);
                    }
                    outcome.errors.push(HookError::UnknownTarget(name.to_string()));
                    continue;
                }
            }
        }

        // Each dispatch gets its own copy of the options.
        let options = descriptor.message_options().clone();
        match core
            .dispatcher
            .dispatch(descriptor.target(), options, instance.as_ref())
            .await
        {
            Ok(()) => outcome.dispatched += 1,
            Err(e) => {
                if core.config.enable_logging {
                    error!(
                        "Hook dispatch failed for {} on {}/{}: {}",
                        descriptor.target().name(),
                        entity_type,
                        kind,
                        e
                    );
                }
                outcome.errors.push(e);
            }
        }
    }

    outcome
}

fn eligible(guard: Option<&Guard>, instance: &dyn Entity) -> HookResult<bool> {
    let Some(guard) = guard else {
        return Ok(true);
    };
    match instance.predicate(guard.predicate()) {
        Some(value) => Ok(guard.permits(value)),
        None => Err(HookError::UnknownGuard(guard.predicate().to_string())),
    }
}
