#[cfg(not(target_os = "android"))]
fn main() -> anyhow::Result<()> {
    use layoutlab_platform::{DesktopConfig, run_desktop_app};

    env_logger::init();
    layoutlab_search::load_assets();
    run_desktop_app(DesktopConfig::default().title("Search"), layoutlab_search::app)
}

#[cfg(target_os = "android")]
fn main() {}
