//! # Views, slots and locals
//!
//! LayoutLab describes UI as a tree of plain `View` values rebuilt on every
//! frame. State that must survive a rebuild lives outside the tree:
//!
//! - `Signal<T>`: cloneable shared value.
//! - `remember_with_key` / `remember_state_with_key`: storage bound to a key
//!   inside a composition pass.
//!
//! ```rust
//! use layoutlab_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! Keyed slots belong to the [`Scheduler`] that runs the pass, so two
//! schedulers never share state. A slot that is not touched during a pass is
//! dropped when the pass ends, so state owned by a view goes away together
//! with the view.
//!
//! Global UI parameters (theme, typography, shapes, density, window insets)
//! are composition locals, see [`locals`].

pub mod color;
pub mod error;
pub mod geometry;
pub mod input;
pub mod locals;
pub mod modifier;
pub mod prelude;
pub mod render_api;
pub mod resources;
pub mod runtime;
pub mod semantics;
pub mod signal;
pub mod tests;
pub mod view;

pub use color::*;
pub use error::*;
pub use geometry::*;
pub use input::*;
pub use locals::*;
pub use modifier::*;
pub use prelude::*;
pub use render_api::*;
pub use resources::*;
pub use runtime::*;
pub use semantics::*;
pub use signal::*;
pub use view::*;
