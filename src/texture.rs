use std::collections::HashMap;

use log::{error, info, warn};
use thiserror::Error;

/// Channel layout of a decoded image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    fn expand(self, texel: &[u8]) -> [u8; 4] {
        match self {
            Self::Gray => [texel[0], texel[0], texel[0], 255],
            Self::GrayAlpha => [texel[0], texel[0], texel[0], texel[1]],
            Self::Rgb => [texel[0], texel[1], texel[2], 255],
            Self::Rgba => [texel[0], texel[1], texel[2], texel[3]],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("failed to decode texture {filename}")]
    Decode { filename: String },
    #[error("texture {name}: expected {expected} bytes for {width}x{height}, got {actual}")]
    SizeMismatch {
        name: String,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("texture {name} has zero size ({width}x{height})")]
    ZeroSize { name: String, width: u32, height: u32 },
}

/// One RGBA8 mip level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// RGBA8 texture with its full mip chain, level 0 first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    name: String,
    levels: Vec<MipLevel>,
}

impl Texture {
    pub fn from_pixels(
        name: &str,
        pixels: &[u8],
        width: u32,
        height: u32,
        layout: ChannelLayout,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize {
                name: name.to_string(),
                width,
                height,
            });
        }
        let expected = width as usize * height as usize * layout.channels();
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                name: name.to_string(),
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        let base = MipLevel {
            width,
            height,
            pixels: pixels
                .chunks_exact(layout.channels())
                .flat_map(|texel| layout.expand(texel))
                .collect(),
        };
        let mut levels = vec![base];
        while let Some(next) = levels.last().and_then(downsample) {
            levels.push(next);
        }

        Ok(Self {
            name: name.to_string(),
            levels,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

/// 2x2 box filter. Odd edges clamp to the last row/column.
fn downsample(level: &MipLevel) -> Option<MipLevel> {
    if level.width == 1 && level.height == 1 {
        return None;
    }
    let width = (level.width / 2).max(1);
    let height = (level.height / 2).max(1);
    let texel = |x: u32, y: u32| {
        let x = x.min(level.width - 1) as usize;
        let y = y.min(level.height - 1) as usize;
        let start = (y * level.width as usize + x) * 4;
        &level.pixels[start..start + 4]
    };

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let samples = [
                texel(2 * x, 2 * y),
                texel(2 * x + 1, 2 * y),
                texel(2 * x, 2 * y + 1),
                texel(2 * x + 1, 2 * y + 1),
            ];
            for channel in 0..4 {
                let sum: u32 = samples.iter().map(|s| s[channel] as u32).sum();
                pixels.push(((sum + 2) / 4) as u8);
            }
        }
    }
    Some(MipLevel {
        width,
        height,
        pixels,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Loaded textures keyed by asset name.
#[derive(Debug, Default)]
pub struct TextureStore {
    textures: Vec<Texture>,
    by_name: HashMap<String, TextureHandle>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a decoded image. `None` means the decoder failed.
    pub fn load_texture(
        &mut self,
        name: &str,
        pixels: Option<&[u8]>,
        width: u32,
        height: u32,
        layout: ChannelLayout,
    ) -> Result<TextureHandle, TextureError> {
        let result = pixels
            .ok_or_else(|| TextureError::Decode {
                filename: name.to_string(),
            })
            .and_then(|pixels| Texture::from_pixels(name, pixels, width, height, layout));
        let texture = match result {
            Ok(texture) => texture,
            Err(err) => {
                error!("{err}");
                return Err(err);
            }
        };

        info!(
            "loaded texture {name} ({width}x{height}, {} mip levels)",
            texture.mip_level_count()
        );
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(texture);
        self.by_name.insert(name.to_string(), handle);
        Ok(handle)
    }

    pub fn handle(&self, name: &str) -> Option<TextureHandle> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureHandle, &Texture)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(index, texture)| (TextureHandle(index as u32), texture))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// The single texture unit textured draws sample from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextureUnit {
    bound: Option<TextureHandle>,
}

impl TextureUnit {
    /// Binds `name` if it loaded; otherwise keeps whatever was bound before.
    pub fn bind(&mut self, store: &TextureStore, name: &str) -> Option<TextureHandle> {
        match store.handle(name) {
            Some(handle) => self.bound = Some(handle),
            None => warn!("texture {name} is not loaded, sampling previous binding"),
        }
        self.bound
    }

    pub fn bound(&self) -> Option<TextureHandle> {
        self.bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_is_expanded_and_mipmapped_to_one_texel() {
        let pixels = vec![200u8; 4 * 2 * 3];
        let texture = Texture::from_pixels("t", &pixels, 4, 2, ChannelLayout::Rgb).unwrap();
        assert_eq!(texture.mip_level_count(), 3);
        let dims: Vec<_> = texture.levels().iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims, vec![(4, 2), (2, 1), (1, 1)]);
        assert_eq!(&texture.levels()[0].pixels[..4], &[200, 200, 200, 255]);
        assert_eq!(texture.levels()[2].pixels, vec![200, 200, 200, 255]);
    }

    #[test]
    fn gray_alpha_expands_to_rgba() {
        let texture = Texture::from_pixels("g", &[10, 20], 1, 1, ChannelLayout::GrayAlpha).unwrap();
        assert_eq!(texture.levels()[0].pixels, vec![10, 10, 10, 20]);
        assert_eq!(texture.mip_level_count(), 1);
    }

    #[test]
    fn box_filter_averages_quads() {
        let pixels = [0, 0, 0, 255, 100, 100, 100, 255, 200, 200, 200, 255, 100, 100, 100, 255];
        let texture = Texture::from_pixels("b", &pixels, 2, 2, ChannelLayout::Rgba).unwrap();
        assert_eq!(texture.levels()[1].pixels, vec![100, 100, 100, 255]);
    }

    #[test]
    fn failed_decode_registers_nothing() {
        let mut store = TextureStore::new();
        let err = store
            .load_texture("bottle.jpg", None, 0, 0, ChannelLayout::Rgb)
            .unwrap_err();
        assert_eq!(
            err,
            TextureError::Decode {
                filename: "bottle.jpg".into()
            }
        );
        assert!(store.is_empty());
        assert_eq!(store.handle("bottle.jpg"), None);
    }

    #[test]
    fn size_errors_are_reported() {
        let mut store = TextureStore::new();
        assert!(matches!(
            store.load_texture("a", Some(&[1, 2]), 1, 1, ChannelLayout::Rgb),
            Err(TextureError::SizeMismatch { expected: 3, actual: 2, .. })
        ));
        assert!(matches!(
            store.load_texture("b", Some(&[]), 0, 4, ChannelLayout::Rgb),
            Err(TextureError::ZeroSize { .. })
        ));
    }

    #[test]
    fn texture_unit_keeps_previous_binding_on_missing_asset() {
        let mut store = TextureStore::new();
        let leather = store
            .load_texture("leather.jpg", Some(&[1, 2, 3]), 1, 1, ChannelLayout::Rgb)
            .unwrap();

        let mut unit = TextureUnit::default();
        assert_eq!(unit.bind(&store, "bottle.jpg"), None);
        assert_eq!(unit.bind(&store, "leather.jpg"), Some(leather));
        assert_eq!(unit.bind(&store, "bottle.jpg"), Some(leather));
        assert_eq!(store.get(leather).map(Texture::name), Some("leather.jpg"));
    }
}
