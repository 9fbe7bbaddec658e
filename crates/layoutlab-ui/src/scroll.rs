//! # Scroll model
//!
//! Scroll *containers* (`ViewKind::ScrollV` / `ViewKind::ScrollH`) are dumb:
//! they clip, translate their children and report sizes. The *state* lives in
//! a [`ScrollState`], which owns the offset, the last measured viewport and
//! content extents, and a fling velocity.
//!
//! ```rust
//! use layoutlab_core::*;
//! use layoutlab_ui::*;
//!
//! fn LongList() -> View {
//!     let state = scroll::remember_scroll_state("list");
//!     let content = Column(Modifier::new())
//!         .child((0..100).map(|i| Text(format!("Row {i}"))).collect::<Vec<_>>());
//!     scroll::ScrollArea(Modifier::new().fill_max_size(), state, content)
//! }
//! ```
//!
//! `scroll_immediate` consumes a delta and returns the part it could not
//! use, so an outer container can take the rest (nested scrolling).

use std::cell::Cell;
use std::rc::Rc;

use layoutlab_core::*;
use web_time::Instant;

/// Velocity below which a fling stops (px/s).
const MIN_FLING_VELOCITY: f32 = 10.0;
/// Fling velocity is multiplied by this once per 60 Hz frame.
const FLING_DECAY_PER_FRAME: f32 = 0.90;

/// Single-axis scroll position with inertia. All values are px.
pub struct ScrollState {
    offset: Signal<f32>,
    viewport: Signal<f32>,
    content: Signal<f32>,

    vel_px_s: Cell<f32>,
    last_t: Cell<Instant>,
    last_input_t: Cell<Instant>,
    animating: Cell<bool>,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollState {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            offset: signal(0.0),
            viewport: signal(0.0),
            content: signal(0.0),
            vel_px_s: Cell::new(0.0),
            last_t: Cell::new(now),
            last_input_t: Cell::new(now),
            animating: Cell::new(false),
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset.get()
    }

    /// Last measured viewport extent; 0 before the first layout.
    pub fn viewport(&self) -> f32 {
        self.viewport.get()
    }

    pub fn content(&self) -> f32 {
        self.content.get()
    }

    pub fn max_offset(&self) -> f32 {
        (self.content.get() - self.viewport.get()).max(0.0)
    }

    pub fn set_viewport(&self, v: f32) {
        self.viewport.set(v.max(0.0));
        self.clamp();
    }

    pub fn set_content(&self, c: f32) {
        self.content.set(c.max(0.0));
        self.clamp();
    }

    pub fn set_offset(&self, off: f32) {
        self.offset.set(off.clamp(0.0, self.max_offset()));
    }

    fn clamp(&self) {
        let max_off = self.max_offset();
        let off = self.offset.get();
        if !(0.0..=max_off).contains(&off) {
            self.offset.set(off.clamp(0.0, max_off));
        }
    }

    /// Consume `delta` px, clamp to bounds, return the leftover.
    pub fn scroll_immediate(&self, delta: f32) -> f32 {
        let before = self.offset.get();
        let new_off = (before + delta).clamp(0.0, self.max_offset());
        self.offset.set(new_off);
        let consumed = new_off - before;

        // Velocity estimate (px/s) from input cadence.
        let now = Instant::now();
        let dt = (now - self.last_input_t.get())
            .as_secs_f32()
            .clamp(1.0 / 240.0, 1.0 / 15.0);
        self.last_input_t.set(now);
        self.last_t.set(now);
        self.vel_px_s.set(consumed / dt);
        self.animating
            .set(self.vel_px_s.get().abs() > MIN_FLING_VELOCITY);

        delta - consumed
    }

    /// Stops any fling in progress.
    pub fn stop(&self) {
        self.vel_px_s.set(0.0);
        self.animating.set(false);
    }

    pub fn is_animating(&self) -> bool {
        self.animating.get()
    }

    /// Advance inertia one tick; returns true while still moving.
    pub fn tick(&self) -> bool {
        if !self.animating.get() {
            return false;
        }
        let now = Instant::now();
        let dt = (now - self.last_t.get()).as_secs_f32().min(0.1);
        self.last_t.set(now);
        if dt <= 0.0 {
            return true;
        }

        let vel = self.vel_px_s.get();
        if vel.abs() < MIN_FLING_VELOCITY {
            self.stop();
            return false;
        }

        let before = self.offset.get();
        let max_off = self.max_offset();
        let new_off = (before + vel * dt).clamp(0.0, max_off);
        self.offset.set(new_off);

        if (new_off - before).abs() < 0.01 && (new_off <= 0.0 || new_off >= max_off) {
            self.stop();
            return false;
        }

        self.vel_px_s
            .set(vel * FLING_DECAY_PER_FRAME.powf(dt * 60.0));
        true
    }

    /// Callbacks for a scroll container driven by this state along one axis.
    pub fn hooks(self: &Rc<Self>, horizontal: bool) -> ScrollHooks {
        let on_scroll = {
            let st = self.clone();
            Rc::new(move |d: Vec2| -> Vec2 {
                if horizontal {
                    Vec2 {
                        x: st.scroll_immediate(d.x),
                        y: d.y,
                    }
                } else {
                    Vec2 {
                        x: d.x,
                        y: st.scroll_immediate(d.y),
                    }
                }
            }) as Rc<dyn Fn(Vec2) -> Vec2>
        };
        let set_viewport = {
            let st = self.clone();
            Rc::new(move |v: f32| st.set_viewport(v)) as Rc<dyn Fn(f32)>
        };
        let set_content = {
            let st = self.clone();
            Rc::new(move |c: f32| st.set_content(c)) as Rc<dyn Fn(f32)>
        };
        let get_offset = {
            let st = self.clone();
            Rc::new(move || {
                if st.tick() {
                    request_frame();
                }
                st.offset()
            }) as Rc<dyn Fn() -> f32>
        };
        ScrollHooks {
            on_scroll: Some(on_scroll),
            set_viewport: Some(set_viewport),
            set_content: Some(set_content),
            get_offset: Some(get_offset),
        }
    }
}

/// Remembered ScrollState (requires unique key).
pub fn remember_scroll_state(key: impl Into<String>) -> Rc<ScrollState> {
    remember_with_key(key.into(), ScrollState::new)
}

/// Vertical scroll container, like `verticalScroll`.
pub fn ScrollArea(modifier: Modifier, state: Rc<ScrollState>, content: View) -> View {
    View::new(0, ViewKind::ScrollV(state.hooks(false)))
        .modifier(modifier)
        .with_children(vec![content])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_clamps_and_returns_leftover() {
        let st = ScrollState::new();
        st.set_viewport(100.0);
        st.set_content(250.0);

        assert_eq!(st.scroll_immediate(120.0), 0.0);
        assert_eq!(st.offset(), 120.0);
        // Only 30 px left before the end.
        assert_eq!(st.scroll_immediate(50.0), 20.0);
        assert_eq!(st.offset(), 150.0);
        assert_eq!(st.scroll_immediate(-500.0), -350.0);
        assert_eq!(st.offset(), 0.0);
    }

    #[test]
    fn shrinking_content_pulls_offset_back() {
        let st = ScrollState::new();
        st.set_viewport(100.0);
        st.set_content(400.0);
        st.set_offset(300.0);
        st.set_content(150.0);
        assert_eq!(st.offset(), 50.0);
        st.set_viewport(200.0);
        assert_eq!(st.offset(), 0.0);
    }

    #[test]
    fn hooks_route_the_right_axis() {
        let st = Rc::new(ScrollState::new());
        st.set_viewport(10.0);
        st.set_content(100.0);
        let h = st.hooks(true);
        let on_scroll = h.on_scroll.unwrap();
        let left = on_scroll(Vec2 { x: 5.0, y: 7.0 });
        assert_eq!(left, Vec2 { x: 0.0, y: 7.0 });
        assert_eq!(st.offset(), 5.0);

        st.stop();
        (h.set_content.unwrap())(12.0);
        assert_eq!((h.get_offset.unwrap())(), 2.0);
    }
}
