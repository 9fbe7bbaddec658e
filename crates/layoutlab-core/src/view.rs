use std::rc::Rc;

use crate::{Color, ImageHandle, Modifier, Rect, Vec2};

pub type ViewId = u64;

pub type Callback = Rc<dyn Fn()>;
pub type TextCallback = Rc<dyn Fn(String)>;

/// Callbacks a scroll container shares with its state object. Lengths are px
/// along the container's scroll axis.
#[derive(Clone, Default)]
pub struct ScrollHooks {
    /// Consumes a wheel/drag delta and returns what is left over.
    pub on_scroll: Option<Rc<dyn Fn(Vec2) -> Vec2>>,
    pub set_viewport: Option<Rc<dyn Fn(f32)>>,
    pub set_content: Option<Rc<dyn Fn(f32)>>,
    pub get_offset: Option<Rc<dyn Fn() -> f32>>,
}

/// Font weight on the usual 100..=900 scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const BOLD: FontWeight = FontWeight(700);
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::NORMAL
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextOverflow {
    #[default]
    Visible,
    Clip,
    Ellipsis,
}

/// How image pixels map onto the view's bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ContentScale {
    /// Scale uniformly to cover the bounds, cropping the overflow.
    #[default]
    Crop,
    /// Scale uniformly to fit inside the bounds.
    Fit,
    /// Stretch to the bounds.
    FillBounds,
}

#[derive(Clone)]
pub enum ViewKind {
    Surface,
    Box,
    Row,
    Column,
    Stack,
    ScrollV(ScrollHooks),
    ScrollH(ScrollHooks),
    Text {
        text: String,
        /// `None` takes `theme().on_surface`.
        color: Option<Color>,
        /// sp
        font_size: f32,
        weight: FontWeight,
        /// sp; `None` uses the text engine's default for the size.
        line_height: Option<f32>,
        overflow: TextOverflow,
    },
    Image {
        handle: ImageHandle,
        content_scale: ContentScale,
        tint: Option<Color>,
    },
    TextField {
        /// Persistent key for platform-held editing state.
        state_key: u64,
        value: String,
        hint: String,
        on_change: Option<TextCallback>,
    },
}

impl std::fmt::Debug for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::Surface => write!(f, "Surface"),
            ViewKind::Box => write!(f, "Box"),
            ViewKind::Row => write!(f, "Row"),
            ViewKind::Column => write!(f, "Column"),
            ViewKind::Stack => write!(f, "Stack"),
            ViewKind::ScrollV(_) => write!(f, "ScrollV"),
            ViewKind::ScrollH(_) => write!(f, "ScrollH"),
            ViewKind::Text {
                text,
                color,
                font_size,
                weight,
                ..
            } => f
                .debug_struct("Text")
                .field("text", text)
                .field("color", color)
                .field("font_size", font_size)
                .field("weight", weight)
                .finish(),
            ViewKind::Image {
                handle,
                content_scale,
                ..
            } => f
                .debug_struct("Image")
                .field("handle", handle)
                .field("content_scale", content_scale)
                .finish(),
            ViewKind::TextField {
                state_key,
                value,
                hint,
                ..
            } => f
                .debug_struct("TextField")
                .field("state_key", state_key)
                .field("value", value)
                .field("hint", hint)
                .finish(),
        }
    }
}

impl ViewKind {
    /// Short name used by tree dumps.
    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Surface => "Surface",
            ViewKind::Box => "Box",
            ViewKind::Row => "Row",
            ViewKind::Column => "Column",
            ViewKind::Stack => "Stack",
            ViewKind::ScrollV(_) => "ScrollV",
            ViewKind::ScrollH(_) => "ScrollH",
            ViewKind::Text { .. } => "Text",
            ViewKind::Image { .. } => "Image",
            ViewKind::TextField { .. } => "TextField",
        }
    }
}

#[derive(Clone, Debug)]
pub struct View {
    pub id: ViewId,
    pub kind: ViewKind,
    pub modifier: Modifier,
    pub children: Vec<View>,
    pub semantics: Option<crate::semantics::Semantics>,
}

impl View {
    pub fn new(id: ViewId, kind: ViewKind) -> Self {
        View {
            id,
            kind,
            modifier: Modifier::default(),
            children: vec![],
            semantics: None,
        }
    }
    pub fn modifier(mut self, m: Modifier) -> Self {
        self.modifier = m;
        self
    }
    pub fn with_children(mut self, kids: Vec<View>) -> Self {
        self.children = kids;
        self
    }
    pub fn semantics(mut self, s: crate::semantics::Semantics) -> Self {
        self.semantics = Some(s);
        self
    }

    /// Depth-first pre-order walk.
    pub fn visit(&self, f: &mut impl FnMut(&View)) {
        f(self);
        for c in &self.children {
            c.visit(f);
        }
    }

    /// First node (pre-order) whose test tag equals `tag`.
    pub fn find_by_tag(&self, tag: &str) -> Option<&View> {
        if self.modifier.test_tag.as_deref() == Some(tag) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_tag(tag))
    }

    /// Text content of this node, if it is a text view.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ViewKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Renderable scene. Coordinates are physical pixels.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub clear_color: Color,
    pub nodes: Vec<SceneNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode {
    Rect {
        rect: Rect,
        color: Color,
        radius: f32,
    },
    Border {
        rect: Rect,
        color: Color,
        width: f32,
        radius: f32,
    },
    Text {
        rect: Rect,
        text: String,
        color: Color,
        size: f32,
        weight: FontWeight,
    },
    Image {
        rect: Rect,
        handle: ImageHandle,
        /// Normalized source rect (u0, v0, u1, v1).
        uv: [f32; 4],
        radius: f32,
        tint: Option<Color>,
    },
    PushClip {
        rect: Rect,
        radius: f32,
    },
    PopClip,
}
