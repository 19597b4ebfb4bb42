//! Texture identity
//!
//! Batches deduplicate textures by identity. Identities are stable slot-map
//! keys handed out once per texture resource, so they stay valid and unique
//! no matter how the host moves or mutates its texture objects.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable identity of a texture resource
    pub struct TextureId;
}

/// Information about a registered texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    /// Name for debugging
    pub name: String,
}

/// Hands out texture identities and keeps their debug names
#[derive(Debug, Default)]
pub struct TextureRegistry {
    textures: SlotMap<TextureId, TextureInfo>,
}

impl TextureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture resource and return its identity
    pub fn register(&mut self, name: impl Into<String>) -> TextureId {
        let name = name.into();
        log::trace!("Registering texture '{}'", name);
        self.textures.insert(TextureInfo { name })
    }

    /// Forget a texture; its identity is never reissued
    pub fn unregister(&mut self, id: TextureId) -> Option<TextureInfo> {
        self.textures.remove(id)
    }

    /// Look up a registered texture
    pub fn get(&self, id: TextureId) -> Option<&TextureInfo> {
        self.textures.get(id)
    }

    /// Debug name of a texture, `"<unknown>"` if unregistered
    pub fn name(&self, id: TextureId) -> &str {
        self.textures
            .get(id)
            .map_or("<unknown>", |info| info.name.as_str())
    }

    /// Number of registered textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether no textures are registered
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_are_unique_and_stable() {
        let mut registry = TextureRegistry::new();
        let a = registry.register("a");
        let b = registry.register("b");
        assert_ne!(a, b);
        assert_eq!(registry.name(a), "a");
        assert_eq!(registry.len(), 2);

        registry.unregister(a);
        let c = registry.register("c");
        assert_ne!(a, c);
        assert_eq!(registry.name(a), "<unknown>");
        assert_eq!(registry.name(b), "b");
    }
}
