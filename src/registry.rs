//! The hook registry: per-entity-type handler tables and listener
//! installation.

use crate::descriptor::HookDescriptor;
use crate::dispatch::Dispatcher;
use crate::entity::Entity;
use crate::error::{HookError, HookResult};
use crate::event::EventKind;
use crate::fanout::{self, FanoutListener, FireOutcome};
use crate::source::LifecycleSource;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct HookConfig {
    /// Enable registry and fan-out logging
    pub enable_logging: bool,

    /// Check named targets against [`Entity::resolves_method`] before
    /// dispatching; unresolved targets are reported and skipped
    pub verify_targets: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            verify_targets: true,
        }
    }
}

/// Handler table for one entity type.
///
/// Created lazily on the first registration for the type; lives for the
/// process. Skip operations clear handler lists but the table itself, and
/// any listeners already attached, stay.
#[derive(Default)]
pub(crate) struct EntityTable {
    /// Ordered handler lists per kind; insertion order is firing order
    pub(crate) handlers: HashMap<EventKind, Vec<HookDescriptor>>,

    /// Kinds whose native listener has already been attached
    pub(crate) installed: HashSet<EventKind>,
}

/// Shared state the fan-out needs at fire time.
///
/// Installed listeners hold this rather than the whole registry, so the
/// lifecycle source never ends up owning its own owner.
pub(crate) struct FanoutCore {
    pub(crate) tables: DashMap<String, EntityTable>,
    pub(crate) dispatcher: Arc<dyn Dispatcher>,
    pub(crate) config: HookConfig,
}

/// Registry of lifecycle hooks, keyed by entity type.
///
/// Cheap to clone; clones share the same tables.
///
/// # Examples
///
/// ```rust,ignore
/// let registry = HookRegistry::new(source.clone(), dispatcher.clone());
///
/// registry.register(
///     "Widget",
///     EventKind::Create,
///     HookDescriptor::method("send_welcome")
///         .with_guard(Guard::if_("active?"))
///         .with_message_options(MessageOptions::new().with_delay(20)),
/// )?;
/// ```
#[derive(Clone)]
pub struct HookRegistry {
    core: Arc<FanoutCore>,
    source: Arc<dyn LifecycleSource>,
}

impl HookRegistry {
    /// Create a registry with default configuration.
    pub fn new(source: Arc<dyn LifecycleSource>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::with_config(source, dispatcher, HookConfig::default())
    }

    /// Create a registry with custom configuration.
    pub fn with_config(
        source: Arc<dyn LifecycleSource>,
        dispatcher: Arc<dyn Dispatcher>,
        config: HookConfig,
    ) -> Self {
        Self {
            core: Arc::new(FanoutCore {
                tables: DashMap::new(),
                dispatcher,
                config,
            }),
            source,
        }
    }

    /// Start building a registry.
    pub fn builder() -> HookRegistryBuilder {
        HookRegistryBuilder::new()
    }

    /// Register a hook for (entity type, event kind).
    ///
    /// Appends the descriptor to the ordered handler list. The first
    /// registration for a pair attaches the single native listener before
    /// returning; if the source rejects the attachment the registration is
    /// aborted and nothing is recorded. Later registrations for the same
    /// pair never re-attach. Registrations accumulate; identical
    /// descriptors are not deduplicated.
    pub fn register(
        &self,
        entity_type: impl Into<String>,
        kind: EventKind,
        descriptor: HookDescriptor,
    ) -> HookResult<()> {
        let entity_type = entity_type.into();
        // The entry guard is held across the attach call, so a concurrent
        // registration for the same type cannot double-install.
        let mut table = self.core.tables.entry(entity_type.clone()).or_default();

        if !table.installed.contains(&kind) {
            let listener = Arc::new(FanoutListener::new(
                self.core.clone(),
                entity_type.clone(),
                kind,
            ));
            self.source.attach(&entity_type, kind, listener)?;
            table.installed.insert(kind);

            if self.core.config.enable_logging {
                debug!("Installed lifecycle listener for {}/{}", entity_type, kind);
            }
        }

        table.handlers.entry(kind).or_default().push(descriptor);

        if self.core.config.enable_logging {
            debug!("Registered hook for {}/{}", entity_type, kind);
        }
        Ok(())
    }

    /// Snapshot of the registered descriptors for (entity type, kind), in
    /// firing order. Empty if none.
    pub fn handlers_for(&self, entity_type: &str, kind: EventKind) -> Vec<HookDescriptor> {
        self.core
            .tables
            .get(entity_type)
            .and_then(|table| table.handlers.get(&kind).cloned())
            .unwrap_or_default()
    }

    /// Number of hooks registered for (entity type, kind).
    pub fn handler_count(&self, entity_type: &str, kind: EventKind) -> usize {
        self.core
            .tables
            .get(entity_type)
            .and_then(|table| table.handlers.get(&kind).map(Vec::len))
            .unwrap_or(0)
    }

    /// Whether the native listener for (entity type, kind) is attached.
    pub fn is_installed(&self, entity_type: &str, kind: EventKind) -> bool {
        self.core
            .tables
            .get(entity_type)
            .map(|table| table.installed.contains(&kind))
            .unwrap_or(false)
    }

    /// Clear all hooks for one kind on one entity type.
    ///
    /// The attached listener stays; subsequent firings find no handlers
    /// and dispatch nothing.
    pub fn skip(&self, entity_type: &str, kind: EventKind) {
        if let Some(mut table) = self.core.tables.get_mut(entity_type) {
            table.handlers.remove(&kind);
        }
        if self.core.config.enable_logging {
            info!("Skipping {} hooks for {}", kind, entity_type);
        }
    }

    /// Clear all hooks for every kind on one entity type.
    pub fn skip_all(&self, entity_type: &str) {
        if let Some(mut table) = self.core.tables.get_mut(entity_type) {
            table.handlers.clear();
        }
        if self.core.config.enable_logging {
            info!("Skipping all hooks for {}", entity_type);
        }
    }

    /// Fan one lifecycle firing out to every eligible hook.
    ///
    /// Installed listeners call this path once per native firing; it is
    /// public so persistence adapters can also drive it directly.
    pub async fn fire(&self, kind: EventKind, instance: Arc<dyn Entity>) -> FireOutcome {
        fanout::run(&self.core, instance.entity_type(), kind, &instance).await
    }
}

/// Builder for [`HookRegistry`].
pub struct HookRegistryBuilder {
    source: Option<Arc<dyn LifecycleSource>>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    config: HookConfig,
}

impl HookRegistryBuilder {
    /// Create a new registry builder.
    pub fn new() -> Self {
        Self {
            source: None,
            dispatcher: None,
            config: HookConfig::default(),
        }
    }

    /// Set the lifecycle source.
    pub fn source(mut self, source: Arc<dyn LifecycleSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the dispatch bridge.
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Enable/disable logging.
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Enable/disable fire-time target verification.
    pub fn verify_targets(mut self, enabled: bool) -> Self {
        self.config.verify_targets = enabled;
        self
    }

    /// Build the registry.
    pub fn build(self) -> HookResult<HookRegistry> {
        let source = self
            .source
            .ok_or_else(|| HookError::Config("lifecycle source is required".to_string()))?;
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| HookError::Config("dispatcher is required".to_string()))?;
        Ok(HookRegistry::with_config(source, dispatcher, self.config))
    }
}

impl Default for HookRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MemoryDispatcher;
    use crate::source::MemorySource;

    fn registry_with(source: &MemorySource) -> HookRegistry {
        HookRegistry::new(Arc::new(source.clone()), Arc::new(MemoryDispatcher::new()))
    }

    #[test]
    fn test_first_registration_installs_listener() {
        let source = MemorySource::new();
        let registry = registry_with(&source);

        assert!(!registry.is_installed("Widget", EventKind::Create));

        registry
            .register("Widget", EventKind::Create, HookDescriptor::method("h1"))
            .unwrap();

        assert!(registry.is_installed("Widget", EventKind::Create));
        assert_eq!(source.listener_count("Widget", EventKind::Create), 1);
    }

    #[test]
    fn test_reregistration_does_not_reinstall() {
        let source = MemorySource::new();
        let registry = registry_with(&source);

        for _ in 0..5 {
            registry
                .register("Widget", EventKind::Save, HookDescriptor::method("h1"))
                .unwrap();
        }

        assert_eq!(source.listener_count("Widget", EventKind::Save), 1);
        assert_eq!(registry.handler_count("Widget", EventKind::Save), 5);
    }

    #[test]
    fn test_install_per_type_and_kind() {
        let source = MemorySource::new();
        let registry = registry_with(&source);

        registry
            .register("Widget", EventKind::Create, HookDescriptor::method("h1"))
            .unwrap();
        registry
            .register("Widget", EventKind::Update, HookDescriptor::method("h2"))
            .unwrap();
        registry
            .register("Order", EventKind::Create, HookDescriptor::method("h3"))
            .unwrap();

        assert_eq!(source.listener_count("Widget", EventKind::Create), 1);
        assert_eq!(source.listener_count("Widget", EventKind::Update), 1);
        assert_eq!(source.listener_count("Order", EventKind::Create), 1);
    }

    #[test]
    fn test_handlers_for_preserves_order() {
        let source = MemorySource::new();
        let registry = registry_with(&source);

        registry
            .register("Widget", EventKind::Create, HookDescriptor::method("first"))
            .unwrap();
        registry
            .register(
                "Widget",
                EventKind::Create,
                HookDescriptor::method("second"),
            )
            .unwrap();

        let names: Vec<_> = registry
            .handlers_for("Widget", EventKind::Create)
            .iter()
            .map(|descriptor| descriptor.target().name().to_string())
            .collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn test_rejected_install_aborts_registration() {
        let source = MemorySource::new().without_kind(EventKind::Commit);
        let registry = registry_with(&source);

        let result = registry.register("Widget", EventKind::Commit, HookDescriptor::method("h1"));

        assert!(matches!(result, Err(HookError::InstallRejected { .. })));
        assert!(!registry.is_installed("Widget", EventKind::Commit));
        assert_eq!(registry.handler_count("Widget", EventKind::Commit), 0);
    }

    #[test]
    fn test_skip_clears_one_kind() {
        let source = MemorySource::new();
        let registry = registry_with(&source);

        registry
            .register("Widget", EventKind::Create, HookDescriptor::method("h1"))
            .unwrap();
        registry
            .register("Widget", EventKind::Update, HookDescriptor::method("h2"))
            .unwrap();

        registry.skip("Widget", EventKind::Create);

        assert_eq!(registry.handler_count("Widget", EventKind::Create), 0);
        assert_eq!(registry.handler_count("Widget", EventKind::Update), 1);
        // Listener stays attached
        assert!(registry.is_installed("Widget", EventKind::Create));
        assert_eq!(source.listener_count("Widget", EventKind::Create), 1);
    }

    #[test]
    fn test_skip_all_clears_every_kind() {
        let source = MemorySource::new();
        let registry = registry_with(&source);

        registry
            .register("Widget", EventKind::Create, HookDescriptor::method("h1"))
            .unwrap();
        registry
            .register("Widget", EventKind::Save, HookDescriptor::method("h2"))
            .unwrap();
        registry
            .register("Order", EventKind::Create, HookDescriptor::method("h3"))
            .unwrap();

        registry.skip_all("Widget");

        assert_eq!(registry.handler_count("Widget", EventKind::Create), 0);
        assert_eq!(registry.handler_count("Widget", EventKind::Save), 0);
        // Other entity types are untouched
        assert_eq!(registry.handler_count("Order", EventKind::Create), 1);
    }

    #[test]
    fn test_register_after_skip_reuses_listener() {
        let source = MemorySource::new();
        let registry = registry_with(&source);

        registry
            .register("Widget", EventKind::Create, HookDescriptor::method("h1"))
            .unwrap();
        registry.skip("Widget", EventKind::Create);
        registry
            .register("Widget", EventKind::Create, HookDescriptor::method("h2"))
            .unwrap();

        assert_eq!(source.listener_count("Widget", EventKind::Create), 1);
        assert_eq!(registry.handler_count("Widget", EventKind::Create), 1);
    }

    #[test]
    fn test_builder_requires_source_and_dispatcher() {
        let result = HookRegistry::builder().build();
        assert!(matches!(result, Err(HookError::Config(_))));

        let result = HookRegistry::builder()
            .source(Arc::new(MemorySource::new()))
            .dispatcher(Arc::new(MemoryDispatcher::new()))
            .enable_logging(false)
            .verify_targets(false)
            .build();
        assert!(result.is_ok());
    }
}
