//! Android runner on winit's native-activity backend.
//!
//! Touch drives the same [`UiSession`] as the desktop mouse path: a finger
//! that travels past the touch slop scrolls instead of clicking. Focusing a
//! text field shows the soft keyboard; leaving it hides it again.

use std::sync::Arc;

use layoutlab_core::input::PointerKind;
use layoutlab_core::*;
use layoutlab_render_wgpu::WgpuBackend;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::platform::android::EventLoopBuilderExtAndroid;
use winit::platform::android::activity::AndroidApp;
use winit::window::{ImePurpose, Window, WindowAttributes, WindowId};

use crate::keys::{edit_for_ime, edit_for_key, modifiers_from_winit};
use crate::session::{FocusChange, UiSession};

struct AndroidRunner {
    app: AndroidApp,
    root: Box<dyn FnMut(&mut Scheduler) -> View>,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    session: UiSession,
    modifiers: Modifiers,
    /// Finger currently driving the session; other fingers are ignored.
    finger: Option<u64>,
}

impl AndroidRunner {
    fn request_redraw(&self) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    /// System bar insets in dp, from the activity's content rect.
    fn sync_insets(&mut self) {
        let Some(win) = &self.window else { return };
        let size = win.inner_size();
        let content = self.app.content_rect();
        let scale = self.session.scale().max(0.01);
        let insets = WindowInsets {
            left: content.left.max(0) as f32 / scale,
            top: content.top.max(0) as f32 / scale,
            right: (size.width as i32 - content.right).max(0) as f32 / scale,
            bottom: (size.height as i32 - content.bottom).max(0) as f32 / scale,
        };
        self.session.set_insets(insets);
    }

    fn apply_focus(&self, change: FocusChange) {
        let Some(win) = &self.window else { return };
        match change {
            FocusChange::TextField(_) => {
                win.set_ime_allowed(true);
                win.set_ime_purpose(ImePurpose::Normal);
                self.app.show_soft_input(true);
            }
            FocusChange::Other | FocusChange::Cleared => {
                win.set_ime_allowed(false);
                self.app.hide_soft_input(true);
            }
            FocusChange::Unchanged => {}
        }
    }

    fn touch(&mut self, t: winit::event::Touch) -> bool {
        let pos = Vec2::new(t.location.x as f32, t.location.y as f32);
        match t.phase {
            TouchPhase::Started => {
                if self.finger.is_some() {
                    return false;
                }
                self.finger = Some(t.id);
                let change = self
                    .session
                    .pointer_pressed(pos, PointerKind::Touch, self.modifiers);
                self.apply_focus(change);
                true
            }
            _ if self.finger != Some(t.id) => false,
            TouchPhase::Moved => {
                let moved = self
                    .session
                    .pointer_moved(pos, PointerKind::Touch);
                self.session.touch_moved(pos) || moved
            }
            TouchPhase::Ended => {
                self.finger = None;
                self.session.pointer_released(pos, PointerKind::Touch)
            }
            TouchPhase::Cancelled => {
                self.finger = None;
                self.session.cancel_pointer();
                true
            }
        }
    }
}

impl ApplicationHandler<()> for AndroidRunner {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let win = match el.create_window(WindowAttributes::default().with_title("LayoutLab")) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {e:?}");
                el.exit();
                return;
            }
        };
        let size = win.inner_size();
        self.session
            .set_surface((size.width, size.height), win.scale_factor() as f32);

        match WgpuBackend::new(win.clone()) {
            Ok(b) => {
                self.backend = Some(b);
                self.window = Some(win);
                self.sync_insets();
                self.request_redraw();
            }
            Err(e) => {
                log::error!("failed to create wgpu backend: {e:?}");
                el.exit();
            }
        }
    }

    fn suspended(&mut self, _el: &ActiveEventLoop) {
        // The native window is gone; a new surface is built on resume.
        self.backend = None;
        self.window = None;
        self.finger = None;
        self.session.cancel_pointer();
    }

    fn window_event(&mut self, el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let redraw = match event {
            WindowEvent::CloseRequested => {
                el.exit();
                false
            }
            WindowEvent::Resized(size) => {
                let scale = self.session.scale();
                self.session.set_surface((size.width, size.height), scale);
                if let Some(b) = &mut self.backend {
                    b.configure_surface(size.width, size.height);
                }
                self.sync_insets();
                true
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = self.session.sched.size;
                self.session.set_surface(size, scale_factor as f32);
                self.sync_insets();
                true
            }
            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = modifiers_from_winit(m.state());
                false
            }
            WindowEvent::Touch(t) => self.touch(t),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    false
                } else if matches!(
                    event.physical_key,
                    winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::Enter)
                ) {
                    // Single-line fields ignore Enter.
                    !self.session.focused_is_textfield() && self.session.activate_focused()
                } else {
                    match edit_for_key(&event, self.modifiers, self.session.ime_preedit()) {
                        Some(cmd) => self.session.edit(cmd),
                        None => false,
                    }
                }
            }
            WindowEvent::Ime(ime) => match edit_for_ime(ime) {
                Some(cmd) => self.session.edit(cmd),
                None => false,
            },
            WindowEvent::RedrawRequested => {
                if let Some(backend) = self.backend.as_mut() {
                    let scene = self.session.compose(&mut self.root);
                    backend.frame(
                        &scene,
                        GlyphRasterConfig {
                            scale: self.session.scale(),
                        },
                    );
                }
                take_frame_request()
            }
            _ => false,
        };
        if redraw {
            self.request_redraw();
        }
    }

    fn about_to_wait(&mut self, el: &ActiveEventLoop) {
        el.set_control_flow(ControlFlow::Wait);
    }
}

/// Runs `root` inside the given activity until it is destroyed.
pub fn run_android_app(
    app: AndroidApp,
    root: impl FnMut(&mut Scheduler) -> View + 'static,
) -> anyhow::Result<()> {
    let event_loop = EventLoop::builder().with_android_app(app.clone()).build()?;
    let mut runner = AndroidRunner {
        app,
        root: Box::new(root),
        window: None,
        backend: None,
        session: UiSession::new(),
        modifiers: Modifiers::empty(),
        finger: None,
    };
    event_loop.run_app(&mut runner)?;
    Ok(())
}
