#![allow(non_snake_case)]
//! A search page in the style of a mobile "soothe" app: search field,
//! a row of circular avatars and a two-row grid of favorite cards, framed by
//! a bottom navigation bar.
//!
//! The desktop binary and the Android entry point both run [`app`].

pub mod search;
pub mod shell;
pub mod theme;

use std::path::PathBuf;

use layoutlab_core::*;
use layoutlab_ui::resources::{load_image_file, register_image_bytes};

pub use search::{
    DisplayItem, FavoriteItem, FavoriteList, HomeSection, HorizontalItem, HorizontalList,
    ScreenContent, SearchBar, SearchScreen, SearchScreenWith,
};
pub use shell::{BottomNavigation, MainApp};
pub use theme::{SearchTheme, search_theme};

/// Directory that overrides the bundled assets.
pub const ASSETS_ENV: &str = "LAYOUTLAB_ASSETS";

static LOTFI_PNG: &[u8] = include_bytes!("../assets/lotfi.png");

/// Registers the item image. A file named `lotfi.png` under
/// `$LAYOUTLAB_ASSETS` wins over the bundled copy; if neither decodes, the
/// handle stays unregistered and the views draw a placeholder.
pub fn load_assets() {
    let name = search::ITEM_IMAGE;
    if let Some(dir) = std::env::var_os(ASSETS_ENV) {
        let path = PathBuf::from(dir).join(format!("{name}.png"));
        match load_image_file(name, &path) {
            Ok(src) => {
                log::info!("image '{name}' loaded from {}", path.display());
                register_image(ImageHandle::named(name), src);
                return;
            }
            Err(e) => log::warn!("{e}; using bundled image"),
        }
    }
    register_image_bytes(name, LOTFI_PNG);
}

/// Root builder handed to the platform runners.
pub fn app(_s: &mut Scheduler) -> View {
    SearchTheme(MainApp)
}

#[cfg(target_os = "android")]
#[unsafe(no_mangle)]
pub extern "C" fn android_main(android_app: winit::platform::android::activity::AndroidApp) {
    android_logger::init_once(
        android_logger::Config::default().with_max_level(log::LevelFilter::Info),
    );
    load_assets();
    if let Err(e) = layoutlab_platform::android::run_android_app(android_app, app) {
        log::error!("search app exited: {e:?}");
    }
}
