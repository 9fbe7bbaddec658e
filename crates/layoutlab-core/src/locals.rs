//! # Theming and locals
//!
//! Thread-local "composition locals" carry global UI parameters down the
//! tree without threading them through every widget:
//!
//! - `Theme`: color roles for surfaces, text and controls.
//! - `Typography`: the type scale used by text widgets.
//! - `Shapes`: corner radii for small/medium/large containers.
//! - `Density`: dp to px scale factor.
//! - `TextScale`: user text scaling.
//! - `TextDirection`: LTR or RTL.
//! - `WindowInsets`: space taken by system bars when drawing edge-to-edge.
//!
//! Each has a `with_*` helper that overrides it for the duration of a
//! closure and a getter that falls back to the default when unset:
//!
//! ```rust
//! use layoutlab_core::*;
//!
//! let light = Theme {
//!     background: Color::WHITE,
//!     ..Theme::default()
//! };
//!
//! with_theme(light, || {
//!     assert_eq!(theme().background, Color::WHITE);
//! });
//! assert_ne!(theme().background, Color::WHITE);
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::{Color, FontWeight, PaddingValues};

thread_local! {
    static LOCALS_STACK: RefCell<Vec<HashMap<TypeId, Box<dyn Any>>>> = RefCell::new(Vec::new());
}

fn with_locals_frame<R>(f: impl FnOnce() -> R) -> R {
    // Pops even when `f` unwinds.
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            LOCALS_STACK.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    LOCALS_STACK.with(|st| st.borrow_mut().push(HashMap::new()));
    let _guard = Guard;
    f()
}

/// Runs `f` with `value` provided for its type.
pub fn with_local<T: Clone + 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    with_locals_frame(|| {
        LOCALS_STACK.with(|st| {
            if let Some(top) = st.borrow_mut().last_mut() {
                top.insert(TypeId::of::<T>(), Box::new(value));
            }
        });
        f()
    })
}

/// Innermost provided value of type `T`, if any.
pub fn local<T: Clone + 'static>() -> Option<T> {
    LOCALS_STACK.with(|st| {
        st.borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.get(&TypeId::of::<T>()))
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    })
}

/// density-independent pixels (dp)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dp(pub f32);

impl Dp {
    /// Converts this dp value into physical pixels using the current Density.
    pub fn to_px(self) -> f32 {
        self.0 * density().scale
    }
}

/// Convenience: convert a raw dp scalar into px using current Density.
pub fn dp_to_px(dp: f32) -> f32 {
    Dp(dp).to_px()
}

/// Color roles read by widgets and the layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    /// Window background / app root.
    pub background: Color,
    pub on_background: Color,
    /// Default container surface (text fields, bars, sheets).
    pub surface: Color,
    pub on_surface: Color,
    /// Lower-emphasis container, used for tinted cards.
    pub surface_variant: Color,
    pub on_surface_variant: Color,
    pub primary: Color,
    pub on_primary: Color,
    /// Pill behind the selected navigation item.
    pub secondary_container: Color,
    pub on_secondary_container: Color,
    /// Low-emphasis outline/border color; also used for missing images.
    pub outline: Color,
    /// Focus indicators and the text caret.
    pub focus: Color,
    pub scrollbar_thumb: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::from_hex("#121212"),
            on_background: Color::from_hex("#E6E1E5"),
            surface: Color::from_hex("#1E1E1E"),
            on_surface: Color::from_hex("#DDDDDD"),
            surface_variant: Color::from_hex("#49454F"),
            on_surface_variant: Color::from_hex("#CAC4D0"),
            primary: Color::from_hex("#34AF82"),
            on_primary: Color::WHITE,
            secondary_container: Color::from_hex("#4A4458"),
            on_secondary_container: Color::from_hex("#E8DEF8"),
            outline: Color::from_hex("#555555"),
            focus: Color::from_hex("#88CCFF"),
            scrollbar_thumb: Color(0xDD, 0xDD, 0xDD, 140),
            error: Color::from_hex("#ae3636"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyleToken {
    /// Font size in sp.
    pub size: f32,
    pub weight: FontWeight,
    /// Line height in sp.
    pub line_height: f32,
}

impl TextStyleToken {
    pub const fn new(size: f32, weight: FontWeight, line_height: f32) -> Self {
        Self {
            size,
            weight,
            line_height,
        }
    }
}

/// Type scale, named after the Material 3 roles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Typography {
    pub title_medium: TextStyleToken,
    pub body_large: TextStyleToken,
    pub body_medium: TextStyleToken,
    pub label_medium: TextStyleToken,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            title_medium: TextStyleToken::new(16.0, FontWeight::MEDIUM, 24.0),
            body_large: TextStyleToken::new(16.0, FontWeight::NORMAL, 24.0),
            body_medium: TextStyleToken::new(14.0, FontWeight::NORMAL, 20.0),
            label_medium: TextStyleToken::new(12.0, FontWeight::MEDIUM, 16.0),
        }
    }
}

/// Corner radii in dp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shapes {
    pub small: f32,
    pub medium: f32,
    pub large: f32,
}

impl Default for Shapes {
    fn default() -> Self {
        Self {
            small: 4.0,
            medium: 12.0,
            large: 16.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density {
    pub scale: f32, // dp→px multiplier
}

impl Default for Density {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextScale(pub f32);

impl Default for TextScale {
    fn default() -> Self {
        Self(1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

/// Areas covered by status/navigation bars, in dp.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowInsets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl WindowInsets {
    pub fn as_padding(&self) -> PaddingValues {
        PaddingValues {
            left: self.left,
            right: self.right,
            top: self.top,
            bottom: self.bottom,
        }
    }
}

pub fn with_theme<R>(theme: Theme, f: impl FnOnce() -> R) -> R {
    with_local(theme, f)
}

pub fn with_typography<R>(typography: Typography, f: impl FnOnce() -> R) -> R {
    with_local(typography, f)
}

pub fn with_shapes<R>(shapes: Shapes, f: impl FnOnce() -> R) -> R {
    with_local(shapes, f)
}

pub fn with_density<R>(density: Density, f: impl FnOnce() -> R) -> R {
    with_local(density, f)
}

pub fn with_text_scale<R>(ts: TextScale, f: impl FnOnce() -> R) -> R {
    with_local(ts, f)
}

pub fn with_text_direction<R>(dir: TextDirection, f: impl FnOnce() -> R) -> R {
    with_local(dir, f)
}

pub fn with_window_insets<R>(insets: WindowInsets, f: impl FnOnce() -> R) -> R {
    with_local(insets, f)
}

pub fn theme() -> Theme {
    local::<Theme>().unwrap_or_default()
}

pub fn typography() -> Typography {
    local::<Typography>().unwrap_or_default()
}

pub fn shapes() -> Shapes {
    local::<Shapes>().unwrap_or_default()
}

pub fn density() -> Density {
    local::<Density>().unwrap_or_default()
}

pub fn text_scale() -> TextScale {
    local::<TextScale>().unwrap_or_default()
}

pub fn text_direction() -> TextDirection {
    local::<TextDirection>().unwrap_or_default()
}

pub fn window_insets() -> WindowInsets {
    local::<WindowInsets>().unwrap_or_default()
}
