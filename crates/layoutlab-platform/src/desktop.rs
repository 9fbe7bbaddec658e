use std::sync::Arc;

use layoutlab_core::input::PointerKind;
use layoutlab_core::*;
use layoutlab_render_wgpu::WgpuBackend;
use web_time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{ImePurpose, Window, WindowAttributes, WindowId};

use crate::keys::{edit_for_ime, edit_for_key, modifiers_from_winit, wheel_delta_px};
use crate::session::{EditCommand, FocusChange, UiSession};

/// Caret blink half-period; the focused field is repainted at this rate.
const BLINK: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct DesktopConfig {
    pub title: String,
    /// Initial inner size in logical pixels.
    pub width: f64,
    pub height: f64,
    /// dp→px scale; `None` follows the monitor's scale factor.
    pub density: Option<f32>,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            title: "LayoutLab".into(),
            width: 412.0,
            height: 892.0,
            density: None,
        }
    }
}

impl DesktopConfig {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn density(mut self, scale: f32) -> Self {
        self.density = Some(scale);
        self
    }
}

struct DesktopApp {
    config: DesktopConfig,
    root: Box<dyn FnMut(&mut Scheduler) -> View>,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    session: UiSession,
    mouse: Vec2,
    modifiers: Modifiers,
    clipboard: Option<arboard::Clipboard>,
}

impl DesktopApp {
    fn request_redraw(&self) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn scale_for(&self, window: &Window) -> f32 {
        self.config
            .density
            .unwrap_or(window.scale_factor() as f32)
    }

    fn apply_focus(&self, change: FocusChange) {
        let Some(win) = &self.window else { return };
        match change {
            FocusChange::TextField(rect) => {
                win.set_ime_allowed(true);
                win.set_ime_purpose(ImePurpose::Normal);
                win.set_ime_cursor_area(
                    PhysicalPosition::new(rect.x as f64, rect.y as f64),
                    PhysicalSize::new(rect.w as f64, rect.h as f64),
                );
            }
            FocusChange::Other | FocusChange::Cleared => win.set_ime_allowed(false),
            FocusChange::Unchanged => {}
        }
    }

    fn copy_selection(&mut self) -> bool {
        let Some(text) = self.session.selected_text() else {
            return false;
        };
        if let Some(cb) = self.clipboard.as_mut()
            && let Err(e) = cb.set_text(text)
        {
            log::warn!("clipboard write failed: {e}");
        }
        true
    }

    fn paste(&mut self) -> bool {
        let text = match self.clipboard.as_mut().map(|cb| cb.get_text()) {
            Some(Ok(t)) => t,
            Some(Err(e)) => {
                log::debug!("clipboard read failed: {e}");
                return false;
            }
            None => return false,
        };
        self.session.edit(EditCommand::Insert(text))
    }

    /// Returns true when the key was consumed.
    fn handle_key(&mut self, event: &winit::event::KeyEvent) -> bool {
        if event.state != ElementState::Pressed {
            return false;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return false;
        };
        match code {
            KeyCode::F12 => {
                self.session.toggle_inspector();
                return true;
            }
            KeyCode::F11 => {
                let dump = if self.modifiers.shift() {
                    self.session.dump_tree_json()
                } else {
                    self.session.dump_tree()
                };
                if let Some(dump) = dump {
                    log::info!("view tree:\n{dump}");
                }
                return false;
            }
            KeyCode::Tab if !event.repeat => {
                let change = self.session.focus_next(self.modifiers.shift());
                self.apply_focus(change);
                return true;
            }
            KeyCode::Escape => {
                let change = self.session.blur();
                self.apply_focus(change);
                return true;
            }
            _ => {}
        }

        if !self.session.focused_is_textfield() {
            return matches!(code, KeyCode::Enter | KeyCode::Space)
                && !event.repeat
                && self.session.activate_focused();
        }

        if self.modifiers.command() {
            match code {
                KeyCode::KeyC => return self.copy_selection(),
                KeyCode::KeyX => {
                    return self.copy_selection()
                        && self.session.edit(EditCommand::Insert(String::new()));
                }
                KeyCode::KeyV => return self.paste(),
                _ => {}
            }
        }
        // Single-line fields ignore Enter.
        if matches!(code, KeyCode::Enter | KeyCode::NumpadEnter) {
            return false;
        }
        match edit_for_key(event, self.modifiers, self.session.ime_preedit()) {
            Some(cmd) => self.session.edit(cmd),
            None => false,
        }
    }
}

impl ApplicationHandler<()> for DesktopApp {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if self.clipboard.is_none() {
            self.clipboard = arboard::Clipboard::new()
                .map_err(|e| log::warn!("clipboard unavailable: {e}"))
                .ok();
        }
        let attrs = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let win = match el.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {e:?}");
                el.exit();
                return;
            }
        };
        let size = win.inner_size();
        let scale = self.scale_for(&win);
        self.session.set_surface((size.width, size.height), scale);
        log::info!(
            "window {}x{} px, density {scale}",
            size.width,
            size.height
        );

        match WgpuBackend::new(win.clone()) {
            Ok(b) => {
                self.backend = Some(b);
                self.window = Some(win);
                self.request_redraw();
            }
            Err(e) => {
                log::error!("failed to create wgpu backend: {e:?}");
                el.exit();
            }
        }
    }

    fn window_event(&mut self, el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let redraw = match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested");
                el.exit();
                false
            }
            WindowEvent::Resized(size) => {
                let scale = match &self.window {
                    Some(w) => self.scale_for(w),
                    None => self.session.scale(),
                };
                self.session.set_surface((size.width, size.height), scale);
                if let Some(b) = &mut self.backend {
                    b.configure_surface(size.width, size.height);
                }
                true
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let scale = self.config.density.unwrap_or(scale_factor as f32);
                let size = self.session.sched.size;
                self.session.set_surface(size, scale);
                true
            }
            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = modifiers_from_winit(m.state());
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse = Vec2::new(position.x as f32, position.y as f32);
                self.session.pointer_moved(self.mouse, PointerKind::Mouse)
            }
            WindowEvent::CursorLeft { .. } => {
                self.session.cancel_pointer();
                true
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let change =
                        self.session
                            .pointer_pressed(self.mouse, PointerKind::Mouse, self.modifiers);
                    self.apply_focus(change);
                    true
                }
                ElementState::Released => {
                    self.session.pointer_released(self.mouse, PointerKind::Mouse)
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = wheel_delta_px(delta, self.session.scale());
                // Shift turns a vertical wheel into horizontal scrolling.
                let d = if self.modifiers.shift() && dx == 0.0 {
                    Vec2::new(dy, 0.0)
                } else {
                    Vec2::new(dx, dy)
                };
                self.session.scroll(self.mouse, d)
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
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
                // Scroll flings ask for another frame while they move.
                take_frame_request()
            }
            _ => false,
        };
        if redraw {
            self.request_redraw();
        }
    }

    fn about_to_wait(&mut self, el: &ActiveEventLoop) {
        if self.session.focused_is_textfield() {
            el.set_control_flow(ControlFlow::WaitUntil(Instant::now() + BLINK));
            self.request_redraw();
        } else {
            el.set_control_flow(ControlFlow::Wait);
        }
    }
}

/// Opens a window and runs `root` until it is closed.
pub fn run_desktop_app(
    config: DesktopConfig,
    root: impl FnMut(&mut Scheduler) -> View + 'static,
) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = DesktopApp {
        config,
        root: Box::new(root),
        window: None,
        backend: None,
        session: UiSession::new(),
        mouse: Vec2::ZERO,
        modifiers: Modifiers::empty(),
        clipboard: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
