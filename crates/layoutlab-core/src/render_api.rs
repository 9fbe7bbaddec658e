use crate::view::Scene;

#[derive(Clone, Copy, Debug)]
pub struct GlyphRasterConfig {
    /// Pixels per dp; glyphs are rasterized at `size * scale`.
    pub scale: f32,
}

pub trait RenderBackend {
    fn configure_surface(&mut self, width: u32, height: u32);
    fn frame(&mut self, scene: &Scene, glyph_cfg: GlyphRasterConfig);
}
