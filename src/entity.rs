//! The receiver seam between the hook registry and persisted entities.

/// A persistence-layer-managed value whose instances undergo lifecycle
/// events.
///
/// The registry never inspects entity fields; everything it needs goes
/// through this trait. Method and predicate names carried by hook
/// descriptors are resolved here at fire time, not at registration time,
/// so an entity type can be wired up before its behavior exists.
pub trait Entity: Send + Sync + 'static {
    /// Entity type identifier the registry tables are keyed by.
    fn entity_type(&self) -> &str;

    /// Primary-key representation of this instance.
    fn entity_id(&self) -> String;

    /// Stable, reconstructable reference a remote worker uses to re-acquire
    /// this instance before invoking an instance-level target.
    fn remote_ref(&self) -> String {
        format!("{}.unscoped.find({})", self.entity_type(), self.entity_id())
    }

    /// Evaluate a named guard predicate against this instance.
    ///
    /// `None` means the predicate is not recognized, which surfaces as
    /// [`HookError::UnknownGuard`](crate::HookError::UnknownGuard) at fire
    /// time. The default recognizes nothing.
    fn predicate(&self, name: &str) -> Option<bool> {
        let _ = name;
        None
    }

    /// Whether a named target method resolves on this receiver.
    ///
    /// Consulted at fire time when
    /// [`HookConfig::verify_targets`](crate::HookConfig) is enabled. The
    /// default accepts every name, deferring resolution entirely to the
    /// remote worker.
    fn resolves_method(&self, name: &str) -> bool {
        let _ = name;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        id: u64,
    }

    impl Entity for Account {
        fn entity_type(&self) -> &str {
            "Account"
        }

        fn entity_id(&self) -> String {
            self.id.to_string()
        }
    }

    #[test]
    fn test_remote_ref_default_format() {
        let account = Account { id: 42 };
        assert_eq!(account.remote_ref(), "Account.unscoped.find(42)");
    }

    #[test]
    fn test_predicate_default_is_unknown() {
        let account = Account { id: 1 };
        assert_eq!(account.predicate("active?"), None);
    }

    #[test]
    fn test_resolves_method_default_accepts() {
        let account = Account { id: 1 };
        assert!(account.resolves_method("anything"));
    }
}
