//! Glyph atlases: one A8 texture for coverage masks, one RGBA texture for
//! color glyphs (emoji). Both use a shelf packer and grow up to
//! [`MAX_ATLAS_SIZE`] before giving up on a glyph.

use std::collections::HashMap;

use layoutlab_text::GlyphKey;

pub const INITIAL_ATLAS_SIZE: u32 = 1024;
pub const MAX_ATLAS_SIZE: u32 = 4096;

/// Row-based packer with a one texel gutter around every entry.
#[derive(Clone, Debug)]
pub struct ShelfPacker {
    size: u32,
    next_x: u32,
    next_y: u32,
    row_h: u32,
}

impl ShelfPacker {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            next_x: 1,
            next_y: 1,
            row_h: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Top-left corner for a `w`x`h` entry, or `None` when the texture is full.
    pub fn alloc(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w + 2 > self.size || h + 2 > self.size {
            return None;
        }
        if self.next_x + w + 1 > self.size {
            self.next_x = 1;
            self.next_y += self.row_h + 1;
            self.row_h = 0;
        }
        if self.next_y + h + 1 > self.size {
            return None;
        }
        let at = (self.next_x, self.next_y);
        self.next_x += w + 1;
        self.row_h = self.row_h.max(h);
        Some(at)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphInfo {
    pub uv: [f32; 4],
    pub w: f32,
    pub h: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtlasKind {
    Mask,
    Color,
}

impl AtlasKind {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            AtlasKind::Mask => wgpu::TextureFormat::R8Unorm,
            AtlasKind::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }

    fn bytes_per_pixel(self) -> u32 {
        match self {
            AtlasKind::Mask => 1,
            AtlasKind::Color => 4,
        }
    }
}

pub struct GlyphAtlas {
    kind: AtlasKind,
    tex: wgpu::Texture,
    pub view: wgpu::TextureView,
    packer: ShelfPacker,
    map: HashMap<GlyphKey, GlyphInfo>,
    /// Set when the texture was replaced; the bind group must be rebuilt.
    pub dirty: bool,
}

impl GlyphAtlas {
    pub fn new(device: &wgpu::Device, kind: AtlasKind) -> Self {
        let (tex, view) = create_texture(device, kind, INITIAL_ATLAS_SIZE);
        Self {
            kind,
            tex,
            view,
            packer: ShelfPacker::new(INITIAL_ATLAS_SIZE),
            map: HashMap::new(),
            dirty: true,
        }
    }

    /// Looks the glyph up, rasterizing and uploading it on first use.
    /// Returns `None` for empty bitmaps and for glyphs that belong to the
    /// other atlas.
    pub fn get_or_upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: GlyphKey,
    ) -> Option<GlyphInfo> {
        if let Some(info) = self.map.get(&key) {
            return Some(*info);
        }
        let bitmap = layoutlab_text::rasterize(key)?;
        if bitmap.w == 0 || bitmap.h == 0 || bitmap.data.is_empty() {
            return None;
        }
        let is_color = matches!(bitmap.content, cosmic_text::SwashContent::Color);
        if is_color != (self.kind == AtlasKind::Color) {
            return None;
        }

        let (x, y) = match self.packer.alloc(bitmap.w, bitmap.h) {
            Some(at) => at,
            None => {
                self.grow(device, queue);
                self.packer.alloc(bitmap.w, bitmap.h)?
            }
        };
        self.write(queue, x, y, bitmap.w, bitmap.h, &bitmap.data);

        let s = self.packer.size() as f32;
        let info = GlyphInfo {
            uv: [
                x as f32 / s,
                y as f32 / s,
                (x + bitmap.w) as f32 / s,
                (y + bitmap.h) as f32 / s,
            ],
            w: bitmap.w as f32,
            h: bitmap.h as f32,
        };
        self.map.insert(key, info);
        Some(info)
    }

    fn write(&self, queue: &wgpu::Queue, x: u32, y: u32, w: u32, h: u32, data: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.tex,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w * self.kind.bytes_per_pixel()),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Doubles the texture and re-uploads every cached glyph.
    fn grow(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let new_size = (self.packer.size() * 2).min(MAX_ATLAS_SIZE);
        if new_size == self.packer.size() {
            log::warn!("{:?} glyph atlas is full at {new_size}px", self.kind);
            return;
        }
        log::debug!("growing {:?} glyph atlas to {new_size}px", self.kind);
        let (tex, view) = create_texture(device, self.kind, new_size);
        self.tex = tex;
        self.view = view;
        self.packer = ShelfPacker::new(new_size);
        self.dirty = true;

        let keys: Vec<GlyphKey> = self.map.keys().copied().collect();
        self.map.clear();
        for key in keys {
            let _ = self.get_or_upload(device, queue, key);
        }
    }
}

fn create_texture(
    device: &wgpu::Device,
    kind: AtlasKind,
    size: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(match kind {
            AtlasKind::Mask => "glyph atlas A8",
            AtlasKind::Color => "glyph atlas RGBA",
        }),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: kind.format(),
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
    (tex, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packer_wraps_rows() {
        let mut p = ShelfPacker::new(64);
        assert_eq!(p.alloc(30, 10), Some((1, 1)));
        assert_eq!(p.alloc(30, 12), Some((32, 1)));
        // Third entry no longer fits on the first shelf.
        assert_eq!(p.alloc(30, 5), Some((1, 14)));
    }

    #[test]
    fn packer_reports_full() {
        let mut p = ShelfPacker::new(32);
        assert!(p.alloc(40, 4).is_none());
        assert!(p.alloc(20, 20).is_some());
        assert!(p.alloc(20, 20).is_none());
    }
}
