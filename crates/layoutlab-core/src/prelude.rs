pub use crate::color::Color;
pub use crate::error::UiError;
pub use crate::geometry::{Rect, Size, Vec2};
pub use crate::input::*;
pub use crate::locals::{
    Density, Dp, Shapes, TextDirection, TextScale, TextStyleToken, Theme, Typography,
    WindowInsets, density, dp_to_px, local, shapes, text_direction, text_scale, theme, typography,
    window_insets, with_density, with_local, with_shapes, with_text_direction, with_text_scale,
    with_theme, with_typography, with_window_insets,
};
pub use crate::modifier::{Modifier, PaddingValues, Shape};
pub use crate::render_api::{GlyphRasterConfig, RenderBackend};
pub use crate::resources::{ImageHandle, ImageSource, register_image, stable_key};
pub use crate::runtime::{
    ComposeGuard, Composer, Frame, Scheduler, remember_state_with_key, remember_with_key,
};
pub use crate::semantics::{CollectionInfo, Role, Semantics};
pub use crate::signal::{Signal, signal};
pub use crate::view::{
    ContentScale, FontWeight, Scene, SceneNode, TextOverflow, View, ViewId, ViewKind,
};
pub use taffy::{AlignItems, AlignSelf, FlexDirection, JustifyContent};
