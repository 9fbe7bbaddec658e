//! Single-line text over `cosmic-text`.
//!
//! One `FontSystem` and `SwashCache` live behind a process-wide mutex. The
//! layout pass measures with [`measure_line`] and [`line_metrics`], text
//! fields map carets with [`metrics_for_textfield`], and the GPU backend
//! draws with [`shape_line`] + [`rasterize`]. When no font can be found
//! (headless CI, for example) measurement falls back to a fixed per-grapheme
//! advance so layout stays usable.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use ahash::AHasher;
use cosmic_text::{
    Attrs, Buffer, CacheKey, FontSystem, Metrics, Shaping, SwashCache, SwashContent, Weight,
};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use unicode_segmentation::UnicodeSegmentation;

/// Advance per grapheme, as a fraction of the font size, when shaping
/// produced nothing.
const FALLBACK_ADVANCE: f32 = 0.55;
/// Default line height as a multiple of the font size.
const LINE_HEIGHT_RATIO: f32 = 1.3;
/// Ascent/descent as fractions of the font size (Roboto-like metrics).
const ASCENT_RATIO: f32 = 0.93;
const DESCENT_RATIO: f32 = 0.24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey(pub u64);

#[derive(Clone, Copy, Debug)]
pub struct ShapedGlyph {
    pub key: GlyphKey,
    /// Pen position relative to the line start.
    pub x: f32,
    pub w: f32,
    pub h: f32,
    /// Bitmap offset from the pen position (x) and from the baseline (y, up).
    pub bearing_x: f32,
    pub bearing_y: f32,
    pub advance: f32,
}

pub struct GlyphBitmap {
    pub key: GlyphKey,
    pub w: u32,
    pub h: u32,
    pub content: SwashContent,
    /// A8 for masks, RGBA8 for color glyphs.
    pub data: Vec<u8>,
}

/// Vertical metrics of one line, in the same unit as the font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
    /// Distance from the top of the line box to the baseline.
    pub baseline: f32,
}

/// Metrics for a line of size `px` laid out in a box of `line_height`
/// (default `px * 1.3`). Extra leading is split evenly above and below.
pub fn line_metrics(px: f32, line_height: Option<f32>) -> LineMetrics {
    let ascent = px * ASCENT_RATIO;
    let descent = px * DESCENT_RATIO;
    let line_height = line_height.unwrap_or(px * LINE_HEIGHT_RATIO);
    let half_leading = (line_height - ascent - descent) * 0.5;
    LineMetrics {
        ascent,
        descent,
        line_height,
        baseline: half_leading + ascent,
    }
}

struct Engine {
    fs: FontSystem,
    cache: SwashCache,
    // Compact atlas key -> full cosmic_text CacheKey
    key_map: HashMap<GlyphKey, CacheKey>,
}

impl Engine {
    fn get_image(&mut self, key: CacheKey) -> Option<cosmic_text::SwashImage> {
        self.cache.get_image(&mut self.fs, key).clone()
    }

    fn layout(&mut self, text: &str, px: f32, weight: u16) -> Buffer {
        let mut buf = Buffer::new(&mut self.fs, Metrics::new(px, px * LINE_HEIGHT_RATIO));
        {
            let mut b = buf.borrow_with(&mut self.fs);
            b.set_size(None, None);
            let attrs = Attrs::new().weight(Weight(weight));
            b.set_text(text, &attrs, Shaping::Advanced, None);
            b.shape_until_scroll(true);
        }
        buf
    }
}

static ENGINE: OnceCell<Mutex<Engine>> = OnceCell::new();

fn engine() -> &'static Mutex<Engine> {
    ENGINE.get_or_init(|| {
        let fs = FontSystem::new();
        log::debug!("text: font system ready, {} face(s)", fs.db().len());
        Mutex::new(Engine {
            fs,
            cache: SwashCache::new(),
            key_map: HashMap::new(),
        })
    })
}

fn key_from_cachekey(k: &CacheKey) -> GlyphKey {
    let mut h = AHasher::default();
    k.hash(&mut h);
    GlyphKey(h.finish())
}

/// Shapes `text` on one line. Glyph positions are relative to the line start
/// and the baseline.
pub fn shape_line(text: &str, px: f32, weight: u16) -> Vec<ShapedGlyph> {
    if text.is_empty() || px <= 0.0 {
        return Vec::new();
    }
    let mut eng = engine().lock();
    let buf = eng.layout(text, px, weight);

    let mut out = Vec::new();
    for run in buf.layout_runs() {
        for g in run.glyphs {
            let phys = g.physical((0.0, 0.0), 1.0);
            let key = key_from_cachekey(&phys.cache_key);
            eng.key_map.insert(key, phys.cache_key);

            let (w, h, left, top) = match eng.get_image(phys.cache_key) {
                Some(img) => (
                    img.placement.width as f32,
                    img.placement.height as f32,
                    img.placement.left as f32,
                    img.placement.top as f32,
                ),
                None => (0.0, 0.0, 0.0, 0.0),
            };

            out.push(ShapedGlyph {
                key,
                x: phys.x as f32,
                w,
                h,
                bearing_x: left,
                bearing_y: top,
                advance: g.w,
            });
        }
    }
    out
}

/// Rasterizes a glyph previously returned by [`shape_line`].
pub fn rasterize(key: GlyphKey) -> Option<GlyphBitmap> {
    let mut eng = engine().lock();
    let &ck = eng.key_map.get(&key)?;
    let img = eng.get_image(ck)?;
    Some(GlyphBitmap {
        key,
        w: img.placement.width,
        h: img.placement.height,
        content: img.content,
        data: img.data,
    })
}

fn fallback_width(text: &str, px: f32) -> f32 {
    text.graphemes(true).count() as f32 * px * FALLBACK_ADVANCE
}

/// Advance width of `text` on one line.
pub fn measure_line(text: &str, px: f32, weight: u16) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let mut eng = engine().lock();
    let buf = eng.layout(text, px, weight);
    let w = buf
        .layout_runs()
        .map(|run| run.line_w)
        .fold(0.0f32, f32::max);
    if w > 0.0 { w } else { fallback_width(text, px) }
}

/// Longest prefix of `text` (cut at a grapheme boundary) that fits in
/// `max_width` together with a trailing ellipsis.
pub fn ellipsize(text: &str, px: f32, weight: u16, max_width: f32) -> String {
    if measure_line(text, px, weight) <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let budget = max_width - measure_line(ellipsis, px, weight);
    let mut fitted = String::new();
    for g in text.graphemes(true) {
        let candidate = format!("{fitted}{g}");
        if measure_line(&candidate, px, weight) > budget {
            break;
        }
        fitted = candidate;
    }
    fitted.push_str(ellipsis);
    fitted
}

/// Caret positions for a text field: one entry per grapheme boundary.
pub struct TextMetrics {
    /// Cumulative advance at each boundary (len == graphemes + 1).
    pub positions: Vec<f32>,
    /// Byte index of each boundary (len == graphemes + 1).
    pub byte_offsets: Vec<usize>,
}

pub fn metrics_for_textfield(text: &str, px: f32) -> TextMetrics {
    let mut positions = vec![0.0f32];
    let mut byte_offsets = vec![0usize];
    if text.is_empty() {
        return TextMetrics {
            positions,
            byte_offsets,
        };
    }

    // Right edge of the glyph covering each byte.
    let mut glyph_ends: Vec<(usize, f32)> = Vec::new();
    {
        let mut eng = engine().lock();
        let buf = eng.layout(text, px, 400);
        for run in buf.layout_runs() {
            for g in run.glyphs {
                glyph_ends.push((g.end, g.x + g.w));
            }
        }
    }

    let mut fallback_x = 0.0f32;
    for (start, g) in text.grapheme_indices(true) {
        let end = start + g.len();
        fallback_x += px * FALLBACK_ADVANCE;
        let x = if glyph_ends.is_empty() {
            fallback_x
        } else {
            glyph_ends
                .iter()
                .filter(|(e, _)| *e <= end)
                .map(|(_, x)| *x)
                .fold(0.0f32, f32::max)
        };
        positions.push(x.max(*positions.last().unwrap_or(&0.0)));
        byte_offsets.push(end);
    }
    TextMetrics {
        positions,
        byte_offsets,
    }
}
