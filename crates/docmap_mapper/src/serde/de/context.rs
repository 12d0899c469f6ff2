use crate::reference::CollectionBridge;
use crate::registry::{TypeRegistry, TypeRegistryArc};

// -----------------------------------------------------------------------------
// DecodeContext

/// State shared by all members of one decode.
pub struct DecodeContext<'a> {
    registry: &'a TypeRegistry,
    shared: &'a TypeRegistryArc,
    bridge: Option<&'a dyn CollectionBridge>,
    deny_unknown_fields: bool,
    fill_absent_members: bool,
    depth: usize,
}

impl<'a> DecodeContext<'a> {
    /// `registry` must be a guard of `shared`; references built during the
    /// decode keep `shared` to resolve their targets later.
    pub fn new(registry: &'a TypeRegistry, shared: &'a TypeRegistryArc) -> Self {
        Self {
            registry,
            shared,
            bridge: None,
            deny_unknown_fields: false,
            fill_absent_members: false,
            depth: 0,
        }
    }

    #[inline]
    pub fn with_bridge(mut self, bridge: Option<&'a dyn CollectionBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    #[inline]
    pub fn with_deny_unknown_fields(mut self, deny: bool) -> Self {
        self.deny_unknown_fields = deny;
        self
    }

    #[inline]
    pub fn with_fill_absent_members(mut self, fill: bool) -> Self {
        self.fill_absent_members = fill;
        self
    }

    #[inline]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    #[inline]
    pub fn shared_registry(&self) -> &'a TypeRegistryArc {
        self.shared
    }

    #[inline]
    pub fn bridge(&self) -> Option<&'a dyn CollectionBridge> {
        self.bridge
    }

    #[inline]
    pub fn deny_unknown_fields(&self) -> bool {
        self.deny_unknown_fields
    }

    /// Whether absent members take their empty value.
    #[inline]
    pub fn fill_absent_members(&self) -> bool {
        self.fill_absent_members
    }

    /// Nesting depth of the document being read; `0` for the outermost one.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub(super) fn enter(&mut self) {
        self.depth += 1;
    }

    #[inline]
    pub(super) fn leave(&mut self) {
        self.depth -= 1;
    }
}
