use std::rc::Rc;

use taffy::{AlignItems, AlignSelf, JustifyContent};

use crate::{Color, Rect, Scene, Size, Vec2};

#[derive(Clone, Debug, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: Color,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PaddingValues {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl PaddingValues {
    pub const ZERO: PaddingValues = PaddingValues {
        left: 0.0,
        right: 0.0,
        top: 0.0,
        bottom: 0.0,
    };

    pub fn all(v: f32) -> Self {
        Self {
            left: v,
            right: v,
            top: v,
            bottom: v,
        }
    }

    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self {
            left: horizontal,
            right: horizontal,
            top: vertical,
            bottom: vertical,
        }
    }

    pub fn horizontal(v: f32) -> Self {
        Self::symmetric(v, 0.0)
    }

    fn add(self, o: PaddingValues) -> Self {
        Self {
            left: self.left + o.left,
            right: self.right + o.right,
            top: self.top + o.top,
            bottom: self.bottom + o.bottom,
        }
    }
}

/// Outline used for clipping and backgrounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Rectangle,
    /// Corner radius in dp.
    Rounded(f32),
    Circle,
}

impl Shape {
    /// Corner radius (px) for a rect of the given size.
    pub fn radius_for(&self, rect: Rect, scale: f32) -> f32 {
        match self {
            Shape::Rectangle => 0.0,
            Shape::Rounded(r) => (r * scale).min(rect.w.min(rect.h) * 0.5),
            Shape::Circle => rect.w.min(rect.h) * 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PositionType {
    Relative,
    Absolute,
}

/// Distances from the first/last text baseline to the layout edges, in dp.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BaselinePadding {
    pub top: Option<f32>,
    pub bottom: Option<f32>,
}

/// Layout, drawing and input decorations for a `View`. All lengths are dp.
///
/// Padding calls accumulate, so `.padding_horizontal(8.0).padding(12.0)`
/// gives 20 dp on the left and right. Margin works the same way and sits
/// outside the background.
#[derive(Clone, Default)]
pub struct Modifier {
    pub size: Option<Size>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub fill_max: bool,
    pub fill_max_w: bool,
    pub fill_max_h: bool,
    pub padding: Option<PaddingValues>,
    pub margin: Option<PaddingValues>,
    pub padding_from_baseline: Option<BaselinePadding>,
    pub min_width: Option<f32>,
    pub min_height: Option<f32>,
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
    pub background: Option<Color>,
    pub border: Option<Border>,
    pub clip: Option<Shape>,
    pub flex_grow: Option<f32>,
    pub flex_shrink: Option<f32>,
    pub align_self: Option<AlignSelf>,
    pub justify_content: Option<JustifyContent>,
    pub align_items: Option<AlignItems>,
    /// Space between consecutive children of a Row/Column.
    pub spacing: Option<f32>,
    /// Works for hit-testing only, draw order is not changed.
    pub z_index: f32,
    pub on_click: Option<Rc<dyn Fn()>>,
    pub on_scroll: Option<Rc<dyn Fn(Vec2) -> Vec2>>,
    pub position_type: Option<PositionType>,
    pub offset_left: Option<f32>,
    pub offset_right: Option<f32>,
    pub offset_top: Option<f32>,
    pub offset_bottom: Option<f32>,
    pub test_tag: Option<String>,
    pub painter: Option<Rc<dyn Fn(&mut Scene, Rect)>>,
}

impl std::fmt::Debug for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cb = |set: bool| if set { Some("...") } else { None };
        f.debug_struct("Modifier")
            .field("size", &self.size)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fill_max", &self.fill_max)
            .field("fill_max_w", &self.fill_max_w)
            .field("fill_max_h", &self.fill_max_h)
            .field("padding", &self.padding)
            .field("margin", &self.margin)
            .field("padding_from_baseline", &self.padding_from_baseline)
            .field("min_width", &self.min_width)
            .field("min_height", &self.min_height)
            .field("max_width", &self.max_width)
            .field("max_height", &self.max_height)
            .field("background", &self.background)
            .field("border", &self.border)
            .field("clip", &self.clip)
            .field("flex_grow", &self.flex_grow)
            .field("flex_shrink", &self.flex_shrink)
            .field("align_self", &self.align_self)
            .field("justify_content", &self.justify_content)
            .field("align_items", &self.align_items)
            .field("spacing", &self.spacing)
            .field("z_index", &self.z_index)
            .field("on_click", &cb(self.on_click.is_some()))
            .field("on_scroll", &cb(self.on_scroll.is_some()))
            .field("position_type", &self.position_type)
            .field("offset_left", &self.offset_left)
            .field("offset_right", &self.offset_right)
            .field("offset_top", &self.offset_top)
            .field("offset_bottom", &self.offset_bottom)
            .field("test_tag", &self.test_tag)
            .field("painter", &cb(self.painter.is_some()))
            .finish()
    }
}

impl Modifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed size, equivalent to `width(w).height(h)`.
    pub fn size(mut self, w: f32, h: f32) -> Self {
        self.size = Some(Size {
            width: w,
            height: h,
        });
        self
    }
    pub fn width(mut self, w: f32) -> Self {
        self.width = Some(w);
        self
    }
    pub fn height(mut self, h: f32) -> Self {
        self.height = Some(h);
        self
    }
    pub fn fill_max_size(mut self) -> Self {
        self.fill_max = true;
        self
    }
    pub fn fill_max_width(mut self) -> Self {
        self.fill_max_w = true;
        self
    }
    pub fn fill_max_height(mut self) -> Self {
        self.fill_max_h = true;
        self
    }

    pub fn padding(self, v: f32) -> Self {
        self.padding_values(PaddingValues::all(v))
    }
    pub fn padding_horizontal(self, v: f32) -> Self {
        self.padding_values(PaddingValues::symmetric(v, 0.0))
    }
    pub fn padding_vertical(self, v: f32) -> Self {
        self.padding_values(PaddingValues::symmetric(0.0, v))
    }
    pub fn padding_start(self, v: f32) -> Self {
        self.padding_values(PaddingValues {
            left: v,
            ..PaddingValues::ZERO
        })
    }
    pub fn padding_values(mut self, p: PaddingValues) -> Self {
        self.padding = Some(self.padding.unwrap_or_default().add(p));
        self
    }

    pub fn margin(self, v: f32) -> Self {
        self.margin_values(PaddingValues::all(v))
    }
    pub fn margin_horizontal(self, v: f32) -> Self {
        self.margin_values(PaddingValues::symmetric(v, 0.0))
    }
    pub fn margin_vertical(self, v: f32) -> Self {
        self.margin_values(PaddingValues::symmetric(0.0, v))
    }
    pub fn margin_values(mut self, p: PaddingValues) -> Self {
        self.margin = Some(self.margin.unwrap_or_default().add(p));
        self
    }

    /// Positions text so its first baseline sits `top` below the top edge and
    /// its last baseline sits `bottom` above the bottom edge. Only meaningful
    /// on text views; ignored elsewhere.
    pub fn padding_from_baseline(mut self, top: f32, bottom: f32) -> Self {
        self.padding_from_baseline = Some(BaselinePadding {
            top: Some(top),
            bottom: Some(bottom),
        });
        self
    }

    pub fn min_size(mut self, w: f32, h: f32) -> Self {
        self.min_width = Some(w);
        self.min_height = Some(h);
        self
    }
    pub fn min_width(mut self, w: f32) -> Self {
        self.min_width = Some(w);
        self
    }
    pub fn min_height(mut self, h: f32) -> Self {
        self.min_height = Some(h);
        self
    }
    pub fn max_width(mut self, w: f32) -> Self {
        self.max_width = Some(w);
        self
    }
    pub fn max_height(mut self, h: f32) -> Self {
        self.max_height = Some(h);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }
    pub fn border(mut self, width: f32, color: Color, radius: f32) -> Self {
        self.border = Some(Border {
            width,
            color,
            radius,
        });
        self
    }
    /// Clips background, content and hit area to `shape`.
    pub fn clip(mut self, shape: Shape) -> Self {
        self.clip = Some(shape);
        self
    }
    pub fn clip_rounded(self, radius: f32) -> Self {
        self.clip(Shape::Rounded(radius))
    }
    pub fn clip_circle(self) -> Self {
        self.clip(Shape::Circle)
    }

    pub fn flex_grow(mut self, v: f32) -> Self {
        self.flex_grow = Some(v);
        self
    }
    pub fn flex_shrink(mut self, v: f32) -> Self {
        self.flex_shrink = Some(v);
        self
    }
    /// Compose-style weight: share the remaining main-axis space.
    pub fn weight(self, w: f32) -> Self {
        self.flex_grow(w).flex_shrink(1.0)
    }
    pub fn align_self(mut self, a: AlignSelf) -> Self {
        self.align_self = Some(a);
        self
    }
    pub fn align_self_center(mut self) -> Self {
        self.align_self = Some(AlignSelf::Center);
        self
    }
    pub fn justify_content(mut self, j: JustifyContent) -> Self {
        self.justify_content = Some(j);
        self
    }
    pub fn align_items(mut self, a: AlignItems) -> Self {
        self.align_items = Some(a);
        self
    }
    pub fn spacing(mut self, gap: f32) -> Self {
        self.spacing = Some(gap);
        self
    }

    pub fn z_index(mut self, z: f32) -> Self {
        self.z_index = z;
        self
    }
    pub fn clickable(mut self, f: impl Fn() + 'static) -> Self {
        self.on_click = Some(Rc::new(f));
        self
    }
    pub fn on_scroll(mut self, f: impl Fn(Vec2) -> Vec2 + 'static) -> Self {
        self.on_scroll = Some(Rc::new(f));
        self
    }

    pub fn absolute(mut self) -> Self {
        self.position_type = Some(PositionType::Absolute);
        self
    }
    pub fn offset(
        mut self,
        left: Option<f32>,
        top: Option<f32>,
        right: Option<f32>,
        bottom: Option<f32>,
    ) -> Self {
        self.offset_left = left;
        self.offset_top = top;
        self.offset_right = right;
        self.offset_bottom = bottom;
        self
    }
    /// Tag shown in tree dumps and used by tests to find a node.
    pub fn test_tag(mut self, tag: impl Into<String>) -> Self {
        self.test_tag = Some(tag.into());
        self
    }
    /// Custom drawing into the node's content rect (px), after background.
    pub fn painter(mut self, f: impl Fn(&mut Scene, Rect) + 'static) -> Self {
        self.painter = Some(Rc::new(f));
        self
    }

    /// Layers `other` on top of `self`: set fields of `other` win, paddings
    /// and margins add up.
    pub fn then(mut self, other: Modifier) -> Self {
        macro_rules! take {
            ($($f:ident),*) => { $( if other.$f.is_some() { self.$f = other.$f; } )* };
        }
        take!(
            size, width, height, padding_from_baseline, min_width, min_height, max_width,
            max_height, background, border, clip, flex_grow, flex_shrink, align_self,
            justify_content, align_items, spacing, on_click, on_scroll, position_type, offset_left,
            offset_right, offset_top, offset_bottom, test_tag, painter
        );
        self.fill_max |= other.fill_max;
        self.fill_max_w |= other.fill_max_w;
        self.fill_max_h |= other.fill_max_h;
        if other.z_index != 0.0 {
            self.z_index = other.z_index;
        }
        if let Some(p) = other.padding {
            self = self.padding_values(p);
        }
        if let Some(m) = other.margin {
            self = self.margin_values(m);
        }
        self
    }
}
