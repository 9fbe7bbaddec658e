//! winit keyboard and IME translation shared by the runners.

use layoutlab_core::Modifiers;
use winit::event::{Ime, KeyEvent, MouseScrollDelta};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use crate::session::EditCommand;

/// Pixels scrolled per wheel line.
const LINE_SCROLL_PX: f32 = 40.0;

pub fn modifiers_from_winit(state: ModifiersState) -> Modifiers {
    let mut m = Modifiers::empty();
    m.set(Modifiers::SHIFT, state.shift_key());
    m.set(Modifiers::CTRL, state.control_key());
    m.set(Modifiers::ALT, state.alt_key());
    m.set(Modifiers::META, state.super_key());
    m
}

/// Wheel delta in pixels, positive moving content up/left.
pub fn wheel_delta_px(delta: MouseScrollDelta, scale: f32) -> (f32, f32) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (-x * LINE_SCROLL_PX * scale, -y * LINE_SCROLL_PX * scale),
        MouseScrollDelta::PixelDelta(p) => (-(p.x as f32), -(p.y as f32)),
    }
}

/// Editing command for a pressed key, if it edits the focused text field.
/// Clipboard shortcuts are handled by the runner.
pub fn edit_for_key(event: &KeyEvent, mods: Modifiers, ime_active: bool) -> Option<EditCommand> {
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    let cmd = match code {
        KeyCode::Backspace => EditCommand::Backspace,
        KeyCode::Delete => EditCommand::Delete,
        KeyCode::ArrowLeft => EditCommand::Left {
            extend: mods.shift(),
        },
        KeyCode::ArrowRight => EditCommand::Right {
            extend: mods.shift(),
        },
        KeyCode::Home => EditCommand::Home,
        KeyCode::End => EditCommand::End,
        KeyCode::KeyA if mods.command() => EditCommand::SelectAll,
        _ => {
            if ime_active || mods.is_shortcut() {
                return None;
            }
            let text = event.text.as_deref()?;
            EditCommand::Insert(text.to_string())
        }
    };
    Some(cmd)
}

pub fn edit_for_ime(ime: Ime) -> Option<EditCommand> {
    match ime {
        Ime::Enabled => None,
        Ime::Preedit(text, cursor) => Some(EditCommand::Preedit(text, cursor)),
        Ime::Commit(text) => Some(EditCommand::Commit(text)),
        Ime::Disabled => Some(EditCommand::CancelComposition),
    }
}
