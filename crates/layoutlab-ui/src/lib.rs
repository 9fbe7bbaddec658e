#![allow(non_snake_case)]
//! Widgets, layout and text fields.
//!
//! Widgets are plain functions returning a [`View`]; children are attached
//! with [`ViewExt::child`], which accepts a single view, a `Vec`, an array, an
//! `Option` or a tuple of any of these.
//!
//! ```rust
//! use layoutlab_core::*;
//! use layoutlab_ui::*;
//!
//! let card = Row(Modifier::new().padding(8.0).align_items(AlignItems::Center)).child((
//!     Box(Modifier::new().size(24.0, 24.0).background(Color::WHITE)),
//!     Text("Label").style(typography().title_medium),
//! ));
//! assert_eq!(card.children.len(), 2);
//! ```

pub mod icons;
pub mod layout;
pub mod lazy;
pub mod material3;
pub mod resources;
pub mod scroll;
pub mod textfield;

use std::collections::HashSet;

use layoutlab_core::*;

pub use icons::{Icon, IconKind};
pub use layout::{TextFieldStates, layout_and_paint, try_layout_and_paint};
pub use lazy::{
    LazyHorizontalGrid, LazyListSpec, LazyListState, LazyRow, remember_lazy_list_state,
};
pub use scroll::{ScrollArea, ScrollState, remember_scroll_state};
pub use textfield::{BasicTextField, TextField, TextFieldOptions, TextFieldState};

/// Pointer state the platform tracks between frames.
#[derive(Default)]
pub struct Interactions {
    pub hover: Option<u64>,
    pub pressed: HashSet<u64>,
}

pub fn Surface(modifier: Modifier, child: View) -> View {
    View::new(0, ViewKind::Surface)
        .modifier(modifier)
        .with_children(vec![child])
}

pub fn Box(modifier: Modifier) -> View {
    View::new(0, ViewKind::Box).modifier(modifier)
}

pub fn Row(modifier: Modifier) -> View {
    View::new(0, ViewKind::Row).modifier(modifier)
}

pub fn Column(modifier: Modifier) -> View {
    View::new(0, ViewKind::Column).modifier(modifier)
}

/// Children overlap in one cell; `absolute()` children are pinned by their
/// offsets instead.
pub fn Stack(modifier: Modifier) -> View {
    View::new(0, ViewKind::Stack).modifier(modifier)
}

/// Single-line text in the `body_large` style.
pub fn Text(text: impl Into<String>) -> View {
    let style = typography().body_large;
    View::new(
        0,
        ViewKind::Text {
            text: text.into(),
            color: None,
            font_size: style.size,
            weight: style.weight,
            line_height: Some(style.line_height),
            overflow: TextOverflow::Visible,
        },
    )
}

pub fn Spacer() -> View {
    Box(Modifier::new().flex_grow(1.0))
}

/// Fixed-size gap, e.g. `Gap(16.0)` at the end of a column.
pub fn Gap(dp: f32) -> View {
    Box(Modifier::new().size(dp, dp))
}

pub fn Image(modifier: Modifier, handle: ImageHandle) -> View {
    View::new(
        0,
        ViewKind::Image {
            handle,
            content_scale: ContentScale::Crop,
            tint: None,
        },
    )
    .modifier(modifier)
}

pub trait ImageExt {
    fn content_scale(self, scale: ContentScale) -> View;
    fn image_tint(self, c: Color) -> View;
}

impl ImageExt for View {
    fn content_scale(mut self, scale: ContentScale) -> View {
        if let ViewKind::Image { content_scale, .. } = &mut self.kind {
            *content_scale = scale;
        }
        self
    }
    fn image_tint(mut self, c: Color) -> View {
        if let ViewKind::Image { tint, .. } = &mut self.kind {
            *tint = Some(c);
        }
        self
    }
}

/// Extension trait for child building
pub trait ViewExt: Sized {
    fn child(self, children: impl IntoChildren) -> Self;
}

impl ViewExt for View {
    fn child(mut self, children: impl IntoChildren) -> Self {
        self.children.extend(children.into_children());
        self
    }
}

pub trait IntoChildren {
    fn into_children(self) -> Vec<View>;
}

impl IntoChildren for View {
    fn into_children(self) -> Vec<View> {
        vec![self]
    }
}

impl IntoChildren for Vec<View> {
    fn into_children(self) -> Vec<View> {
        self
    }
}

impl IntoChildren for Option<View> {
    fn into_children(self) -> Vec<View> {
        self.into_iter().collect()
    }
}

impl<const N: usize> IntoChildren for [View; N] {
    fn into_children(self) -> Vec<View> {
        self.into()
    }
}

macro_rules! impl_into_children_tuple {
    ($($idx:tt $t:ident),+) => {
        impl<$($t: IntoChildren),+> IntoChildren for ($($t,)+) {
            fn into_children(self) -> Vec<View> {
                let mut v = Vec::new();
                $(v.extend(self.$idx.into_children());)+
                v
            }
        }
    };
}

impl_into_children_tuple!(0 A, 1 B);
impl_into_children_tuple!(0 A, 1 B, 2 C);
impl_into_children_tuple!(0 A, 1 B, 2 C, 3 D);
impl_into_children_tuple!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_into_children_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);

/// Method styling for `Text` views; no-ops on other kinds.
pub trait TextStyle {
    fn color(self, c: Color) -> View;
    /// Font size in sp.
    fn size(self, sp: f32) -> View;
    fn weight(self, w: FontWeight) -> View;
    fn line_height(self, sp: f32) -> View;
    /// Applies a typography token (size, weight, line height).
    fn style(self, token: TextStyleToken) -> View;
    fn overflow_ellipsize(self) -> View;
    fn overflow_clip(self) -> View;
}

impl TextStyle for View {
    fn color(mut self, c: Color) -> View {
        if let ViewKind::Text { color, .. } = &mut self.kind {
            *color = Some(c);
        }
        self
    }
    fn size(mut self, sp: f32) -> View {
        if let ViewKind::Text { font_size, .. } = &mut self.kind {
            *font_size = sp;
        }
        self
    }
    fn weight(mut self, w: FontWeight) -> View {
        if let ViewKind::Text { weight, .. } = &mut self.kind {
            *weight = w;
        }
        self
    }
    fn line_height(mut self, sp: f32) -> View {
        if let ViewKind::Text { line_height, .. } = &mut self.kind {
            *line_height = Some(sp);
        }
        self
    }
    fn style(mut self, token: TextStyleToken) -> View {
        if let ViewKind::Text {
            font_size,
            weight,
            line_height,
            ..
        } = &mut self.kind
        {
            *font_size = token.size;
            *weight = token.weight;
            *line_height = Some(token.line_height);
        }
        self
    }
    fn overflow_ellipsize(mut self) -> View {
        if let ViewKind::Text { overflow, .. } = &mut self.kind {
            *overflow = TextOverflow::Ellipsis;
        }
        self
    }
    fn overflow_clip(mut self) -> View {
        if let ViewKind::Text { overflow, .. } = &mut self.kind {
            *overflow = TextOverflow::Clip;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_accepts_mixed_tuples() {
        let none: Option<View> = None;
        let v = Column(Modifier::new()).child((
            Text("a"),
            none,
            vec![Text("b"), Text("c")],
            Some(Text("d")),
        ));
        let labels: Vec<_> = v.children.iter().filter_map(|c| c.text()).collect();
        assert_eq!(labels, ["a", "b", "c", "d"]);
    }

    #[test]
    fn text_style_token_applies() {
        let token = typography().title_medium;
        let v = Text("Favorite exercises").style(token).color(Color::WHITE);
        match v.kind {
            ViewKind::Text {
                font_size,
                weight,
                line_height,
                color,
                ..
            } => {
                assert_eq!(font_size, token.size);
                assert_eq!(weight, token.weight);
                assert_eq!(line_height, Some(token.line_height));
                assert_eq!(color, Some(Color::WHITE));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn text_style_ignores_other_kinds() {
        let v = Box(Modifier::new()).color(Color::WHITE).size(30.0);
        assert!(matches!(v.kind, ViewKind::Box));
    }
}
