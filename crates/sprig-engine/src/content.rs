//! Content loading seam.
//!
//! Decoding image files is left to the host. The engine only needs a way to
//! turn an asset name into a [`TextureHandle`] plus the texture's size, which
//! is what [`ContentLoader`] provides. [`ContentRegistry`] is an in-memory
//! implementation where textures are declared up front.

use std::collections::HashMap;

use glam::Vec2;
use sprig_ecs::draw::TextureHandle;
use tracing::debug;

/// Errors from loading content.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContentError {
    #[error("no content named '{name}'")]
    NotFound { name: String },

    #[error("content '{name}' is already registered")]
    Duplicate { name: String },
}

/// A texture that has been loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureInfo {
    pub handle: TextureHandle,
    pub size: Vec2,
}

/// Synchronous lookup of content by name.
pub trait ContentLoader {
    fn load_texture(&mut self, name: &str) -> Result<TextureInfo, ContentError>;
}

/// Texture table filled in by code.
#[derive(Debug, Default)]
pub struct ContentRegistry {
    textures: HashMap<String, TextureInfo>,
    next_handle: u32,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a texture and hand out its handle.
    pub fn register_texture(&mut self, name: &str, size: Vec2) -> Result<TextureHandle, ContentError> {
        if self.textures.contains_key(name) {
            return Err(ContentError::Duplicate {
                name: name.to_owned(),
            });
        }
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.textures
            .insert(name.to_owned(), TextureInfo { handle, size });
        debug!(texture = name, handle = handle.0, "texture registered");
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl ContentLoader for ContentRegistry {
    fn load_texture(&mut self, name: &str) -> Result<TextureInfo, ContentError> {
        self.textures
            .get(name)
            .copied()
            .ok_or_else(|| ContentError::NotFound {
                name: name.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_load() {
        let mut content = ContentRegistry::new();
        let hero = content.register_texture("hero", Vec2::new(64.0, 32.0)).unwrap();
        let tiles = content.register_texture("tiles", Vec2::splat(256.0)).unwrap();
        assert_ne!(hero, tiles);

        let info = content.load_texture("hero").unwrap();
        assert_eq!(info.handle, hero);
        assert_eq!(info.size, Vec2::new(64.0, 32.0));
        assert_eq!(content.len(), 2);
    }

    #[test]
    fn errors() {
        let mut content = ContentRegistry::new();
        content.register_texture("a", Vec2::ONE).unwrap();
        assert!(matches!(
            content.register_texture("a", Vec2::ONE),
            Err(ContentError::Duplicate { .. })
        ));
        assert!(matches!(
            content.load_texture("b"),
            Err(ContentError::NotFound { .. })
        ));
    }
}
