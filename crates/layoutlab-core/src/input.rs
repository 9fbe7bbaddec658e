/// Device behind a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

bitflags::bitflags! {
    /// Keyboard modifier state at the time of an event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        /// Cmd on macOS, the Windows key elsewhere.
        const META = 1 << 3;
    }
}

impl Modifiers {
    pub fn shift(self) -> bool {
        self.contains(Modifiers::SHIFT)
    }

    /// Ctrl, or Cmd on macOS.
    pub fn command(self) -> bool {
        if cfg!(target_os = "macos") {
            self.contains(Modifiers::META)
        } else {
            self.contains(Modifiers::CTRL)
        }
    }

    /// True when any modifier that turns a key press into a shortcut is held.
    pub fn is_shortcut(self) -> bool {
        self.intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::META)
    }
}
