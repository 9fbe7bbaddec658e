//! Platform runners: desktop via winit, Android via native-activity.
//!
//! Both runners are thin event translators around [`UiSession`], which
//! owns the scheduler, the last composed frame and all input state. That
//! split lets tests drive a whole screen with synthetic pointer and edit
//! events and no window:
//!
//! ```rust
//! use layoutlab_core::*;
//! use layoutlab_platform::UiSession;
//! use layoutlab_ui::*;
//!
//! let mut session = UiSession::new();
//! session.set_surface((400, 300), 1.0);
//! let scene = session.compose(&mut |_s: &mut Scheduler| Text("hello"));
//! assert!(!scene.nodes.is_empty());
//! ```

mod common;
pub mod session;

#[cfg(any(feature = "desktop", feature = "android"))]
mod keys;

#[cfg(feature = "desktop")]
mod desktop;
#[cfg(feature = "desktop")]
pub use desktop::{DesktopConfig, run_desktop_app};

#[cfg(feature = "android")]
pub mod android;

pub use common::compose_frame;
pub use session::{EditCommand, FocusChange, UiSession};
