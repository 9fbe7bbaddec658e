//! Input routing shared by the runners.
//!
//! A [`UiSession`] owns everything that survives between frames on the
//! platform side: the scheduler, the last frame (its hit regions answer
//! pointer queries), editing state of text fields, pointer capture and the
//! devtools inspector. Runners translate window events into calls on the
//! session and redraw when a call returns `true`.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use layoutlab_core::input::PointerKind;
use layoutlab_core::*;
use layoutlab_devtools::{Inspector, Metrics, to_json, tree_dump};
use layoutlab_ui::textfield::{
    TF_PADDING_X, byte_to_char_index, field_font_px, index_for_x_bytes, measure_text,
};
use layoutlab_ui::{Interactions, TextFieldState, TextFieldStates};
use web_time::Instant;

use crate::common::{
    compose_frame, hit_index_by_id, next_focus, prune_textfield_states, sanitize_single_line,
    top_hit_index,
};

/// Drag distance (dp) after which a touch becomes a scroll and no longer
/// clicks.
const TOUCH_SLOP_DP: f32 = 6.0;

/// Editing operations on the focused text field.
#[derive(Clone, Debug, PartialEq)]
pub enum EditCommand {
    Insert(String),
    Backspace,
    Delete,
    Left { extend: bool },
    Right { extend: bool },
    Home,
    End,
    SelectAll,
    Preedit(String, Option<(usize, usize)>),
    Commit(String),
    CancelComposition,
}

/// What a pointer press did to focus; runners use it to toggle IME.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FocusChange {
    Unchanged,
    /// A text field gained focus; the rect is its hit area in pixels.
    TextField(Rect),
    Other,
    Cleared,
}

#[derive(Default)]
struct TouchTrack {
    prev: Option<Vec2>,
    travelled: f32,
    scrolled: bool,
}

pub struct UiSession {
    pub sched: Scheduler,
    pub inspector: Inspector,
    frame: Option<Frame>,
    textfields: TextFieldStates,
    hover: Option<u64>,
    pressed: HashSet<u64>,
    capture: Option<u64>,
    ime_preedit: bool,
    touch: TouchTrack,
    scale: f32,
    insets: WindowInsets,
}

impl Default for UiSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UiSession {
    pub fn new() -> Self {
        Self {
            sched: Scheduler::new(),
            inspector: Inspector::new(),
            frame: None,
            textfields: TextFieldStates::new(),
            hover: None,
            pressed: HashSet::new(),
            capture: None,
            ime_preedit: false,
            touch: TouchTrack::default(),
            scale: 1.0,
            insets: WindowInsets::default(),
        }
    }

    /// Surface size in physical pixels and the dp→px scale.
    pub fn set_surface(&mut self, size: (u32, u32), scale: f32) {
        self.sched.size = size;
        self.scale = scale.max(0.1);
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// System bar insets in dp.
    pub fn set_insets(&mut self, insets: WindowInsets) {
        self.insets = insets;
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn focused(&self) -> Option<u64> {
        self.sched.focused
    }

    pub fn ime_preedit(&self) -> bool {
        self.ime_preedit
    }

    /// Builds, lays out and paints one frame. Returns the scene to draw,
    /// including the inspector overlay when it is enabled.
    pub fn compose(&mut self, root: &mut dyn FnMut(&mut Scheduler) -> View) -> Scene {
        let t0 = Instant::now();
        let interactions = Interactions {
            hover: self.hover,
            pressed: self.pressed.clone(),
        };
        let frame = compose_frame(
            &mut self.sched,
            root,
            self.scale,
            self.insets,
            &interactions,
            &self.textfields,
        );
        let build_layout_ms = t0.elapsed().as_secs_f32() * 1000.0;
        prune_textfield_states(&mut self.textfields, &frame);

        let mut scene = frame.scene.clone();
        self.inspector.hud.metrics = Some(Metrics {
            build_layout_ms,
            scene_nodes: scene.nodes.len(),
            hit_regions: frame.hit_regions.len(),
        });
        self.inspector.frame(&mut scene);
        self.frame = Some(frame);
        scene
    }

    pub fn toggle_inspector(&mut self) {
        self.inspector.hud.toggle_inspector();
    }

    /// Text dump of the last composed tree.
    pub fn dump_tree(&self) -> Option<String> {
        self.frame.as_ref().map(|f| tree_dump(&f.root))
    }

    /// JSON dump of the last composed tree.
    pub fn dump_tree_json(&self) -> Option<String> {
        let frame = self.frame.as_ref()?;
        match to_json(&frame.root) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("tree dump: {e}");
                None
            }
        }
    }

    fn is_textfield(&self, id: u64) -> bool {
        self.frame
            .as_ref()
            .and_then(|f| hit_index_by_id(f, id).map(|i| f.hit_regions[i].tf_state_key.is_some()))
            .unwrap_or(false)
    }

    fn textfield_state(&self, id: u64) -> Option<(Rc<RefCell<TextFieldState>>, Rect)> {
        let f = self.frame.as_ref()?;
        let hit = &f.hit_regions[hit_index_by_id(f, id)?];
        let key = hit.tf_state_key?;
        Some((self.textfields.get(&key)?.clone(), hit.rect))
    }

    fn notify_text_change(&self, id: u64, text: String) {
        if let Some(f) = &self.frame
            && let Some(i) = hit_index_by_id(f, id)
            && let Some(cb) = &f.hit_regions[i].on_text_change
        {
            cb(text);
        }
    }

    /// Byte index under pixel x inside a text field whose hit area is `rect`.
    fn index_at(&self, st: &TextFieldState, rect: Rect, x: f32) -> usize {
        with_density(Density { scale: self.scale }, || {
            let inner_x = rect.x + dp_to_px(TF_PADDING_X);
            let content_x = x - inner_x + st.scroll_offset;
            index_for_x_bytes(&st.text, field_font_px(), content_x.max(0.0))
        })
    }

    fn ensure_caret_visible(&self, st: &mut TextFieldState) {
        with_density(Density { scale: self.scale }, || {
            let m = measure_text(&st.text, field_font_px());
            let caret_x = m
                .positions
                .get(byte_to_char_index(&m, st.caret_index()))
                .copied()
                .unwrap_or(0.0);
            let inner = st.inner_width;
            st.ensure_caret_visible(caret_x, inner);
        });
    }

    fn focus(&mut self, id: Option<u64>) -> FocusChange {
        if self.sched.focused == id {
            return FocusChange::Unchanged;
        }
        self.sched.focused = id;
        self.ime_preedit = false;
        let Some(id) = id else {
            return FocusChange::Cleared;
        };
        let Some(f) = &self.frame else {
            return FocusChange::Other;
        };
        let Some(hit) = hit_index_by_id(f, id).map(|i| &f.hit_regions[i]) else {
            return FocusChange::Other;
        };
        match hit.tf_state_key {
            Some(key) => {
                let value = hit.tf_value.as_deref().unwrap_or("");
                self.textfields.entry(key).or_insert_with(|| {
                    let mut st = TextFieldState::new();
                    st.set_text(value);
                    st.move_end();
                    Rc::new(RefCell::new(st))
                });
                log::debug!("focus text field {id} (state {key})");
                FocusChange::TextField(hit.rect)
            }
            None => FocusChange::Other,
        }
    }

    /// Hover tracking (mouse only), drag selection and the inspector's
    /// hover rect.
    pub fn pointer_moved(&mut self, pos: Vec2, kind: PointerKind) -> bool {
        let Some(f) = &self.frame else { return false };
        let mut redraw = false;

        let top = top_hit_index(f, pos).map(|i| &f.hit_regions[i]);
        let new_hover = match kind {
            PointerKind::Mouse => top.map(|h| h.id),
            PointerKind::Touch => None,
        };
        if new_hover != self.hover {
            self.hover = new_hover;
            redraw = true;
        }
        if self.inspector.hud.inspector_enabled {
            self.inspector.hud.set_hovered(top.map(|h| h.rect));
            redraw = true;
        }

        if let Some(cid) = self.capture
            && let Some((st, rect)) = self.textfield_state(cid)
        {
            let mut st = st.borrow_mut();
            if st.drag_anchor.is_some() {
                let idx = self.index_at(&st, rect, pos.x);
                st.drag_to(idx);
                self.ensure_caret_visible(&mut st);
                redraw = true;
            }
        }
        redraw
    }

    /// Primary press: capture, pressed visuals, focus and caret placement.
    pub fn pointer_pressed(&mut self, pos: Vec2, kind: PointerKind, mods: Modifiers) -> FocusChange {
        self.touch = TouchTrack {
            prev: (kind == PointerKind::Touch).then_some(pos),
            ..TouchTrack::default()
        };
        let hit = self
            .frame
            .as_ref()
            .and_then(|f| top_hit_index(f, pos).map(|i| f.hit_regions[i].clone()));
        let Some(hit) = hit else {
            return self.focus(None);
        };

        self.capture = Some(hit.id);
        self.pressed.insert(hit.id);

        let change = if hit.focusable {
            self.focus(Some(hit.id))
        } else {
            FocusChange::Unchanged
        };

        if let Some((st, rect)) = self.textfield_state(hit.id) {
            let mut st = st.borrow_mut();
            let idx = self.index_at(&st, rect, pos.x);
            st.begin_drag(idx, mods.shift());
            self.ensure_caret_visible(&mut st);
        }
        change
    }

    /// Release: ends drag selection and clicks when the pointer is still over
    /// the captured region (and a touch did not turn into a scroll).
    pub fn pointer_released(&mut self, pos: Vec2, kind: PointerKind) -> bool {
        let Some(cid) = self.capture.take() else {
            return false;
        };
        self.pressed.remove(&cid);
        let touch = std::mem::take(&mut self.touch);
        let scrolled = kind == PointerKind::Touch && touch.scrolled;

        if let Some((st, _)) = self.textfield_state(cid) {
            st.borrow_mut().end_drag();
        }

        let Some(f) = &self.frame else { return true };
        let Some(hit) = hit_index_by_id(f, cid).map(|i| &f.hit_regions[i]) else {
            return true;
        };
        if !scrolled
            && hit.rect.contains(pos)
            && let Some(cb) = &hit.on_click
        {
            cb();
        }
        true
    }

    /// Wheel or trackpad scroll, in pixels (positive scrolls content up/left).
    pub fn scroll(&mut self, pos: Vec2, delta: Vec2) -> bool {
        match &self.frame {
            Some(f) => crate::common::dispatch_scroll(f, pos, delta),
            None => false,
        }
    }

    /// Finger drag. Scrolls whatever is under the finger; once the finger
    /// has travelled past the slop the gesture no longer counts as a click.
    pub fn touch_moved(&mut self, pos: Vec2) -> bool {
        let Some(prev) = self.touch.prev.replace(pos) else {
            return false;
        };
        let d = Vec2::new(prev.x - pos.x, prev.y - pos.y);
        self.touch.travelled += d.x.abs() + d.y.abs();
        let consumed = self.scroll(pos, d);
        if consumed && self.touch.travelled > TOUCH_SLOP_DP * self.scale {
            self.touch.scrolled = true;
            if let Some(cid) = self.capture {
                self.pressed.remove(&cid);
            }
        }
        consumed
    }

    pub fn cancel_pointer(&mut self) {
        if let Some(cid) = self.capture.take() {
            self.pressed.remove(&cid);
        }
        self.touch = TouchTrack::default();
    }

    /// Applies an editing command to the focused field and reports the new
    /// value through its `on_text_change`. Returns true when anything changed.
    pub fn edit(&mut self, cmd: EditCommand) -> bool {
        let Some(fid) = self.sched.focused else {
            return false;
        };
        let Some((st, _)) = self.textfield_state(fid) else {
            return false;
        };
        let mut st = st.borrow_mut();
        let before = st.text.clone();
        match cmd {
            EditCommand::Insert(text) => {
                let text = sanitize_single_line(&text);
                if text.is_empty() && st.selection.is_empty() {
                    return false;
                }
                st.insert_text(&text);
            }
            EditCommand::Backspace => st.delete_backward(),
            EditCommand::Delete => st.delete_forward(),
            EditCommand::Left { extend } => st.move_cursor(-1, extend),
            EditCommand::Right { extend } => st.move_cursor(1, extend),
            EditCommand::Home => st.move_home(),
            EditCommand::End => st.move_end(),
            EditCommand::SelectAll => st.select_all(),
            EditCommand::Preedit(text, cursor) => {
                self.ime_preedit = !text.is_empty();
                st.set_composition(text, cursor);
            }
            EditCommand::Commit(text) => {
                self.ime_preedit = false;
                st.commit_composition(sanitize_single_line(&text));
            }
            EditCommand::CancelComposition => {
                self.ime_preedit = false;
                if st.composition.is_none() {
                    return false;
                }
                st.cancel_composition();
            }
        }
        st.reset_caret_blink();
        self.ensure_caret_visible(&mut st);
        let after = st.text.clone();
        drop(st);
        if after != before {
            self.notify_text_change(fid, after);
        }
        true
    }

    /// Selected text of the focused field, for copy and cut.
    pub fn selected_text(&self) -> Option<String> {
        let fid = self.sched.focused?;
        let (st, _) = self.textfield_state(fid)?;
        let s = st.borrow().selected_text();
        (!s.is_empty()).then_some(s)
    }

    /// Clicks the focused widget (Space/Enter on a focused non-text control).
    pub fn activate_focused(&mut self) -> bool {
        let Some(fid) = self.sched.focused else {
            return false;
        };
        if self.is_textfield(fid) {
            return false;
        }
        let Some(f) = &self.frame else { return false };
        match hit_index_by_id(f, fid).and_then(|i| f.hit_regions[i].on_click.clone()) {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }

    /// Tab / Shift+Tab.
    pub fn focus_next(&mut self, backwards: bool) -> FocusChange {
        let next = self
            .frame
            .as_ref()
            .and_then(|f| next_focus(&f.focus_chain, self.sched.focused, backwards));
        match next {
            Some(id) => self.focus(Some(id)),
            None => FocusChange::Unchanged,
        }
    }

    pub fn blur(&mut self) -> FocusChange {
        self.focus(None)
    }

    pub fn focused_is_textfield(&self) -> bool {
        self.sched.focused.is_some_and(|id| self.is_textfield(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layoutlab_ui::*;

    fn search_root(query: Rc<RefCell<String>>) -> impl FnMut(&mut Scheduler) -> View {
        move |_s| {
            let q = query.clone();
            let value = query.borrow().clone();
            Column(Modifier::new().fill_max_size()).child(TextField(
                value,
                move |t| *q.borrow_mut() = t,
                Modifier::new().fill_max_width(),
                TextFieldOptions::default().hint("Search").state_key(5),
            ))
        }
    }

    fn field_center(session: &UiSession) -> Vec2 {
        let f = session.frame().expect("frame");
        let hit = f
            .hit_regions
            .iter()
            .find(|h| h.tf_state_key.is_some())
            .expect("text field hit");
        Vec2::new(hit.rect.x + hit.rect.w * 0.5, hit.rect.y + hit.rect.h * 0.5)
    }

    #[test]
    fn typing_reports_the_whole_value() {
        let query = Rc::new(RefCell::new(String::new()));
        let mut root = search_root(query.clone());
        let mut session = UiSession::new();
        session.set_surface((400, 300), 1.0);
        session.compose(&mut root);

        let change = session.pointer_pressed(
            field_center(&session),
            PointerKind::Mouse,
            Modifiers::empty(),
        );
        assert!(matches!(change, FocusChange::TextField(_)));
        session.pointer_released(field_center(&session), PointerKind::Mouse);

        for ch in ["y", "o", "g", "a"] {
            assert!(session.edit(EditCommand::Insert(ch.into())));
            session.compose(&mut root);
        }
        assert_eq!(*query.borrow(), "yoga");

        session.edit(EditCommand::SelectAll);
        assert_eq!(session.selected_text().as_deref(), Some("yoga"));
        session.edit(EditCommand::Backspace);
        assert_eq!(*query.borrow(), "");
    }

    #[test]
    fn composition_is_committed_once() {
        let query = Rc::new(RefCell::new(String::new()));
        let mut root = search_root(query.clone());
        let mut session = UiSession::new();
        session.compose(&mut root);
        session.pointer_pressed(field_center(&session), PointerKind::Touch, Modifiers::empty());
        session.pointer_released(field_center(&session), PointerKind::Touch);

        session.edit(EditCommand::Preedit("yo".into(), Some((2, 2))));
        assert!(session.ime_preedit());
        session.edit(EditCommand::Commit("yoga".into()));
        assert!(!session.ime_preedit());
        assert_eq!(*query.borrow(), "yoga");
    }

    #[test]
    fn pressing_outside_clears_focus() {
        let query = Rc::new(RefCell::new(String::new()));
        let mut root = search_root(query);
        let mut session = UiSession::new();
        session.set_surface((400, 300), 1.0);
        session.compose(&mut root);
        session.pointer_pressed(field_center(&session), PointerKind::Mouse, Modifiers::empty());
        assert!(session.focused_is_textfield());

        let change = session.pointer_pressed(
            Vec2::new(200.0, 290.0),
            PointerKind::Mouse,
            Modifiers::empty(),
        );
        assert_eq!(change, FocusChange::Cleared);
        assert!(!session.edit(EditCommand::Insert("x".into())));
    }

    #[test]
    fn editing_state_is_dropped_with_the_field() {
        let query = Rc::new(RefCell::new(String::new()));
        let show = Rc::new(RefCell::new(true));
        let inner = search_root(query.clone());
        let inner = Rc::new(RefCell::new(inner));
        let (s2, i2) = (show.clone(), inner.clone());
        let mut root = move |s: &mut Scheduler| {
            if *s2.borrow() {
                (*i2.borrow_mut())(s)
            } else {
                Box(Modifier::new().fill_max_size())
            }
        };
        let mut session = UiSession::new();
        session.compose(&mut root);
        session.pointer_pressed(field_center(&session), PointerKind::Mouse, Modifiers::empty());
        session.edit(EditCommand::Insert("abc".into()));
        assert_eq!(session.textfields.len(), 1);

        *show.borrow_mut() = false;
        session.compose(&mut root);
        assert!(session.textfields.is_empty());
        assert_eq!(session.focused(), None);
    }

    #[test]
    fn click_fires_on_release_inside() {
        let clicks = Rc::new(RefCell::new(0));
        let c = clicks.clone();
        // The root is stretched to the surface, so the box needs a parent.
        let mut root = move |_s: &mut Scheduler| {
            let c = c.clone();
            Column(Modifier::new()).child(Box(Modifier::new().size(100.0, 100.0).clickable(
                move || {
                    *c.borrow_mut() += 1;
                },
            )))
        };
        let mut session = UiSession::new();
        session.compose(&mut root);

        let inside = Vec2::new(50.0, 50.0);
        session.pointer_pressed(inside, PointerKind::Mouse, Modifiers::empty());
        session.pointer_released(inside, PointerKind::Mouse);
        assert_eq!(*clicks.borrow(), 1);

        session.pointer_pressed(inside, PointerKind::Mouse, Modifiers::empty());
        session.pointer_released(Vec2::new(150.0, 50.0), PointerKind::Mouse);
        assert_eq!(*clicks.borrow(), 1);
    }

    #[test]
    fn only_the_mouse_hovers() {
        let mut root = |_s: &mut Scheduler| {
            Column(Modifier::new()).child(Box(Modifier::new().size(100.0, 100.0).clickable(|| {})))
        };
        let mut session = UiSession::new();
        session.compose(&mut root);

        let over = Vec2::new(50.0, 50.0);
        assert!(!session.pointer_moved(over, PointerKind::Touch));
        assert!(session.pointer_moved(over, PointerKind::Mouse));
        assert!(!session.pointer_moved(over, PointerKind::Mouse));
    }

    #[test]
    fn tree_dumps_describe_the_last_frame() {
        let mut session = UiSession::new();
        assert!(session.dump_tree_json().is_none());

        let mut root = search_root(Rc::new(RefCell::new(String::new())));
        session.compose(&mut root);
        let json = session.dump_tree_json().expect("json");
        assert!(json.contains("\"kind\": \"Column\""));
        assert!(json.contains("\"kind\": \"TextField\""));
        assert!(session.dump_tree().is_some_and(|d| d.starts_with("Column")));
    }
}
