//! Entity lifecycle hooks bridged to asynchronous message dispatch.
//!
//! Sidetrack connects the synchronous lifecycle events a persistence layer
//! raises (create, update, save, commit) to an asynchronous transport, so
//! side effects of those events run out-of-band instead of inline with the
//! persistence operation.
//!
//! ## Features
//!
//! - **Hook registry** - Ordered, per-entity-type hook tables per event kind
//! - **Single native listener** - Exactly one listener attached per
//!   (entity type, event kind), no matter how many hooks sit behind it
//! - **Guards** - `if`/`unless` predicates evaluated per instance at fire time
//! - **Message options** - Per-hook transport options (delay, priority, ...)
//!   forwarded verbatim with each dispatch
//! - **Fan-out isolation** - One failing hook never suppresses its siblings
//!   and never fails the persistence operation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sidetrack::*;
//! use std::sync::Arc;
//!
//! struct Widget { id: u64, active: bool }
//!
//! impl Entity for Widget {
//!     fn entity_type(&self) -> &str { "Widget" }
//!     fn entity_id(&self) -> String { self.id.to_string() }
//!     fn predicate(&self, name: &str) -> Option<bool> {
//!         match name {
//!             "active?" => Some(self.active),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> HookResult<()> {
//!     let source = Arc::new(MemorySource::new());
//!     let dispatcher = Arc::new(MemoryDispatcher::new());
//!     let registry = HookRegistry::new(source.clone(), dispatcher.clone());
//!
//!     // Dispatch `send_welcome` to active widgets, 20 seconds after create
//!     registry.register(
//!         "Widget",
//!         EventKind::Create,
//!         HookDescriptor::method("send_welcome")
//!             .with_guard(Guard::if_("active?"))
//!             .with_message_options(MessageOptions::new().with_delay(20)),
//!     )?;
//!
//!     // The persistence layer reports the firing; the registry fans out
//!     source.persist_new(Arc::new(Widget { id: 7, active: true })).await;
//!
//!     assert_eq!(dispatcher.record_count(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Multiple hooks
//!
//! ```rust,ignore
//! // All three accumulate and fire in registration order
//! registry.register("Widget", EventKind::Save, HookDescriptor::method("audit"))?;
//! registry.register("Widget", EventKind::Save, HookDescriptor::method("sync_index"))?;
//! registry.register("Widget", EventKind::Save, HookDescriptor::callback(|w| {
//!     println!("saved {}", w.remote_ref());
//!     Ok(())
//! }))?;
//! ```
//!
//! ## Suppressing hooks
//!
//! ```rust,ignore
//! registry.skip("Widget", EventKind::Create);  // one kind
//! registry.skip_all("Widget");                 // every kind
//! // Listeners stay attached; subsequent firings dispatch nothing.
//! ```

pub mod descriptor;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod event;
pub mod fanout;
pub mod registry;
pub mod source;

pub use descriptor::{Guard, HookDescriptor, HookTarget, MessageOptions};
pub use dispatch::{DispatchRecord, Dispatcher, MemoryDispatcher};
pub use entity::Entity;
pub use error::{HookError, HookResult};
pub use event::EventKind;
pub use fanout::FireOutcome;
pub use registry::{HookConfig, HookRegistry, HookRegistryBuilder};
pub use source::{LifecycleListener, LifecycleSource, MemorySource};
