//! Billboard textures.
//!
//! Images are decoded with the `image` crate from bytes handed over by an
//! [`AssetSource`]. A texture that is missing or fails to decode is replaced
//! by a 1x1 white pixel, so particles still show up as plain quads.
//!
//! # Supported Formats
//!
//! - PNG (recommended)
//! - JPEG

use std::collections::HashMap;

use crate::assets::AssetSource;
use crate::error::TextureError;

/// Filter mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Smooth linear filtering (default).
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering.
    Nearest,
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Row-major RGBA, 4 bytes per pixel.
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filter: FilterMode,
}

impl TextureData {
    /// Wrap raw RGBA data.
    ///
    /// # Panics
    ///
    /// If `rgba` is not `width * height * 4` bytes long.
    pub fn from_rgba(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            rgba.len(),
            (width * height * 4) as usize,
            "RGBA data size mismatch"
        );
        Self {
            rgba,
            width,
            height,
            filter: FilterMode::Linear,
        }
    }

    /// A 1x1 texture of one color.
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            filter: FilterMode::Nearest,
            ..Self::from_rgba(vec![r, g, b, a], 1, 1)
        }
    }

    /// The fallback texture.
    pub fn white() -> Self {
        Self::solid(255, 255, 255, 255)
    }

    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(img.into_raw(), width, height))
    }

    /// Read and decode `path`, reporting why it failed.
    pub fn try_load(assets: &dyn AssetSource, path: &str) -> Result<Self, TextureError> {
        let bytes = assets
            .read(path)
            .ok_or_else(|| TextureError::NotFound(path.to_string()))?;
        Self::decode(&bytes)
    }

    /// Read and decode `path`, falling back to white.
    pub fn load(assets: &dyn AssetSource, path: &str) -> Self {
        match Self::try_load(assets, path) {
            Ok(tex) => {
                log::info!("Loaded texture {} ({}x{})", path, tex.width, tex.height);
                tex
            }
            Err(e) => {
                log::warn!("{}; using a blank texture", e);
                Self::white()
            }
        }
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }
}

/// Handle to a texture in a [`TextureRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(usize);

impl TextureId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Loaded textures, deduplicated by logical path.
///
/// Slot 0 is always the white fallback.
#[derive(Debug)]
pub struct TextureRegistry {
    textures: Vec<TextureData>,
    by_path: HashMap<String, TextureId>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self {
            textures: vec![TextureData::white()],
            by_path: HashMap::new(),
        }
    }

    /// The white fallback.
    pub fn blank(&self) -> TextureId {
        TextureId(0)
    }

    /// Load `path` once; later calls return the same id.
    pub fn load(&mut self, assets: &dyn AssetSource, path: &str) -> TextureId {
        if let Some(&id) = self.by_path.get(path) {
            return id;
        }
        let id = TextureId(self.textures.len());
        self.textures.push(TextureData::load(assets, path));
        self.by_path.insert(path.to_string(), id);
        id
    }

    /// Id of an already loaded path.
    pub fn id_of(&self, path: &str) -> Option<TextureId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, id: TextureId) -> &TextureData {
        &self.textures[id.0]
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &TextureData)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(i, tex)| (TextureId(i), tex))
    }
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
