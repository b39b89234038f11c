//! The hand-off boundary to the asynchronous transport.

use crate::descriptor::{HookTarget, MessageOptions};
use crate::entity::Entity;
use crate::error::HookResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Bridge between the fan-out and an external asynchronous transport.
///
/// Implementations perform no lifecycle logic; they hand the invocation
/// request off for deferred execution elsewhere. Retry and delivery
/// ordering are the transport's business. The fan-out calls this once per
/// eligible descriptor, with that descriptor's own copy of the options.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Hand off one asynchronous invocation request.
    ///
    /// `receiver` must be representable for the transport: instance-level
    /// targets use [`Entity::remote_ref`], class-level targets use
    /// [`Entity::entity_type`].
    async fn dispatch(
        &self,
        target: &HookTarget,
        options: MessageOptions,
        receiver: &dyn Entity,
    ) -> HookResult<()>;
}

/// One recorded hand-off, as a transport or worker would see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Unique request identifier
    pub id: Uuid,

    /// Target name (`<callback>` for inline targets)
    pub target: String,

    /// Whether the target is class-level
    pub class_level: bool,

    /// Options forwarded from the descriptor, verbatim
    pub options: MessageOptions,

    /// Receiver reference the worker would re-acquire the entity from
    pub receiver: String,

    /// When the hand-off was accepted
    pub dispatched_at: DateTime<Utc>,
}

/// In-process transport.
///
/// Records every accepted hand-off and runs [`HookTarget::Callback`]
/// targets inline, since there is no remote worker to defer them to.
/// Suitable for tests and for applications that want lifecycle side
/// effects without an external broker.
#[derive(Clone, Default)]
pub struct MemoryDispatcher {
    records: Arc<RwLock<Vec<DispatchRecord>>>,
}

impl MemoryDispatcher {
    /// Create an empty in-process transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all accepted hand-offs, in dispatch order.
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.records.read().unwrap().clone()
    }

    /// Number of accepted hand-offs.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Drop all recorded hand-offs.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
    }
}

#[async_trait]
impl Dispatcher for MemoryDispatcher {
    async fn dispatch(
        &self,
        target: &HookTarget,
        options: MessageOptions,
        receiver: &dyn Entity,
    ) -> HookResult<()> {
        if let HookTarget::Callback(callback) = target {
            callback(receiver)?;
        }

        let receiver_ref = if target.is_class_level() {
            receiver.entity_type().to_string()
        } else {
            receiver.remote_ref()
        };

        let record = DispatchRecord {
            id: Uuid::new_v4(),
            target: target.name().to_string(),
            class_level: target.is_class_level(),
            options,
            receiver: receiver_ref,
            dispatched_at: Utc::now(),
        };

        self.records.write().unwrap().push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Widget {
        id: u64,
    }

    impl Entity for Widget {
        fn entity_type(&self) -> &str {
            "Widget"
        }

        fn entity_id(&self) -> String {
            self.id.to_string()
        }
    }

    #[tokio::test]
    async fn test_method_dispatch_records_remote_ref() {
        let dispatcher = MemoryDispatcher::new();
        let widget = Widget { id: 7 };

        dispatcher
            .dispatch(
                &HookTarget::method("send_welcome"),
                MessageOptions::new(),
                &widget,
            )
            .await
            .unwrap();

        let records = dispatcher.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, "send_welcome");
        assert_eq!(records[0].receiver, "Widget.unscoped.find(7)");
        assert!(!records[0].class_level);
        assert!(records[0].options.is_empty());
    }

    #[tokio::test]
    async fn test_class_method_dispatch_records_type() {
        let dispatcher = MemoryDispatcher::new();
        let widget = Widget { id: 7 };

        dispatcher
            .dispatch(
                &HookTarget::class_method("reindex"),
                MessageOptions::new(),
                &widget,
            )
            .await
            .unwrap();

        let records = dispatcher.records();
        assert_eq!(records[0].receiver, "Widget");
        assert!(records[0].class_level);
    }

    #[tokio::test]
    async fn test_callback_runs_inline() {
        let dispatcher = MemoryDispatcher::new();
        let widget = Widget { id: 1 };
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let target = HookTarget::callback(move |instance| {
            assert_eq!(instance.entity_type(), "Widget");
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        dispatcher
            .dispatch(&target, MessageOptions::new(), &widget)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.records()[0].target, "<callback>");
    }

    #[tokio::test]
    async fn test_failed_callback_is_not_recorded() {
        let dispatcher = MemoryDispatcher::new();
        let widget = Widget { id: 1 };

        let target = HookTarget::callback(|_| {
            Err(crate::HookError::Dispatch("boom".to_string()))
        });

        let result = dispatcher
            .dispatch(&target, MessageOptions::new(), &widget)
            .await;

        assert!(result.is_err());
        assert_eq!(dispatcher.record_count(), 0);
    }

    #[tokio::test]
    async fn test_options_recorded_verbatim() {
        let dispatcher = MemoryDispatcher::new();
        let widget = Widget { id: 1 };
        let options = MessageOptions::new().with_delay(20).with_priority(2);

        dispatcher
            .dispatch(&HookTarget::method("notify"), options.clone(), &widget)
            .await
            .unwrap();

        assert_eq!(dispatcher.records()[0].options, options);
    }
}
