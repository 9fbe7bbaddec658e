//! Single-line text input.
//!
//! Editing happens on a [`TextFieldState`] owned by the platform runner and
//! keyed by the view's `state_key`. The view itself is controlled: it shows
//! the `value` the caller passes and reports edits through `on_change`.

use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

use layoutlab_core::*;
use unicode_segmentation::UnicodeSegmentation;
use web_time::Instant;

use crate::{Row, ViewExt};

/// Horizontal inner padding of the editable area (dp).
pub const TF_PADDING_X: f32 = 16.0;
/// Minimum container height (dp).
pub const TF_MIN_HEIGHT: f32 = 56.0;

pub use layoutlab_text::TextMetrics;

/// Font size of field text in px: `body_large` under the current density
/// and text scale.
pub fn field_font_px() -> f32 {
    dp_to_px(typography().body_large.size) * text_scale().0
}

pub fn measure_text(text: &str, px: f32) -> TextMetrics {
    layoutlab_text::metrics_for_textfield(text, px)
}

/// Grapheme index for a byte position.
pub fn byte_to_char_index(m: &TextMetrics, byte: usize) -> usize {
    match m.byte_offsets.binary_search(&byte) {
        Ok(i) | Err(i) => i,
    }
}

/// Byte offset of the grapheme boundary nearest to `x` (content coordinates).
pub fn index_for_x_bytes(text: &str, px: f32, x: f32) -> usize {
    let m = measure_text(text, px);
    let best = m
        .positions
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - x).abs().total_cmp(&(*b - x).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0);
    m.byte_offsets.get(best).copied().unwrap_or(text.len())
}

fn prev_grapheme_boundary(text: &str, byte: usize) -> usize {
    text.grapheme_indices(true)
        .map(|(i, _)| i)
        .take_while(|&i| i < byte)
        .last()
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, byte: usize) -> usize {
    text.grapheme_indices(true)
        .map(|(i, _)| i)
        .find(|&i| i > byte)
        .unwrap_or(text.len())
}

fn clamp_to_char_boundary(s: &str, i: usize) -> usize {
    let mut j = i.min(s.len());
    while j > 0 && !s.is_char_boundary(j) {
        j -= 1;
    }
    j
}

fn char_to_byte(s: &str, ci: usize) -> usize {
    s.char_indices().nth(ci).map(|(i, _)| i).unwrap_or(s.len())
}

/// Editing state of one text field. Offsets are bytes into `text`, always on
/// char boundaries.
#[derive(Clone, Debug)]
pub struct TextFieldState {
    pub text: String,
    pub selection: Range<usize>,
    /// Active IME pre-edit span.
    pub composition: Option<Range<usize>>,
    /// Horizontal scroll of the content (px).
    pub scroll_offset: f32,
    pub drag_anchor: Option<usize>,
    pub blink_start: Instant,
    pub inner_width: f32,
}

impl Default for TextFieldState {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFieldState {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            selection: 0..0,
            composition: None,
            scroll_offset: 0.0,
            drag_anchor: None,
            blink_start: Instant::now(),
            inner_width: 0.0,
        }
    }

    /// Adopts a value set from outside (controlled field). The caret and
    /// selection are clamped to the new text; an in-flight composition is
    /// dropped.
    pub fn set_text(&mut self, value: &str) {
        if self.text == value {
            return;
        }
        self.text = value.to_string();
        let s = clamp_to_char_boundary(&self.text, self.selection.start);
        let e = clamp_to_char_boundary(&self.text, self.selection.end);
        self.selection = s.min(e)..s.max(e);
        self.composition = None;
        self.drag_anchor = None;
        if self.text.is_empty() {
            self.scroll_offset = 0.0;
        }
    }

    pub fn insert_text(&mut self, text: &str) {
        let start = clamp_to_char_boundary(&self.text, self.selection.start);
        let end = clamp_to_char_boundary(&self.text, self.selection.end);
        self.text.replace_range(start..end, text);
        let pos = start + text.len();
        self.selection = pos..pos;
        self.drag_anchor = None;
        self.reset_caret_blink();
    }

    pub fn delete_backward(&mut self) {
        if self.selection.is_empty() {
            let pos = self.selection.start.min(self.text.len());
            if pos > 0 {
                let prev = prev_grapheme_boundary(&self.text, pos);
                self.text.replace_range(prev..pos, "");
                self.selection = prev..prev;
            }
        } else {
            self.insert_text("");
        }
        self.reset_caret_blink();
    }

    pub fn delete_forward(&mut self) {
        if self.selection.is_empty() {
            let pos = self.selection.start.min(self.text.len());
            if pos < self.text.len() {
                let next = next_grapheme_boundary(&self.text, pos);
                self.text.replace_range(pos..next, "");
            }
        } else {
            self.insert_text("");
        }
        self.reset_caret_blink();
    }

    /// Moves the caret by `delta` graphemes. With `extend_selection` the
    /// anchor stays put.
    pub fn move_cursor(&mut self, delta: isize, extend_selection: bool) {
        let anchor = self.drag_anchor.unwrap_or(self.selection.start);
        let mut pos = self.caret_index().min(self.text.len());
        for _ in 0..delta.unsigned_abs() {
            pos = if delta < 0 {
                prev_grapheme_boundary(&self.text, pos)
            } else {
                next_grapheme_boundary(&self.text, pos)
            };
        }
        if extend_selection {
            self.selection = anchor.min(pos)..anchor.max(pos);
            self.drag_anchor = Some(anchor);
        } else {
            self.selection = pos..pos;
            self.drag_anchor = None;
        }
        self.reset_caret_blink();
    }

    pub fn move_home(&mut self) {
        self.selection = 0..0;
        self.drag_anchor = None;
        self.reset_caret_blink();
    }

    pub fn move_end(&mut self) {
        let n = self.text.len();
        self.selection = n..n;
        self.drag_anchor = None;
        self.reset_caret_blink();
    }

    pub fn select_all(&mut self) {
        self.selection = 0..self.text.len();
        self.drag_anchor = Some(0);
        self.reset_caret_blink();
    }

    pub fn selected_text(&self) -> String {
        self.text
            .get(self.selection.clone())
            .unwrap_or_default()
            .to_string()
    }

    /// Replaces the IME pre-edit span with `text`. `cursor` is a char range
    /// inside `text`.
    pub fn set_composition(&mut self, text: String, cursor: Option<(usize, usize)>) {
        if text.is_empty() {
            self.cancel_composition();
            return;
        }

        let anchor = match self.composition.take() {
            Some(r) => {
                let s = clamp_to_char_boundary(&self.text, r.start);
                let e = clamp_to_char_boundary(&self.text, r.end);
                let (s, e) = (s.min(e), s.max(e));
                self.text.replace_range(s..e, &text);
                s
            }
            None => {
                let s = clamp_to_char_boundary(&self.text, self.selection.start);
                let e = clamp_to_char_boundary(&self.text, self.selection.end);
                self.text.replace_range(s..e, &text);
                s
            }
        };

        self.composition = Some(anchor..anchor + text.len());
        self.selection = match cursor {
            Some((c0, c1)) => (anchor + char_to_byte(&text, c0))..(anchor + char_to_byte(&text, c1)),
            None => {
                let end = anchor + text.len();
                end..end
            }
        };
        self.reset_caret_blink();
    }

    pub fn commit_composition(&mut self, text: String) {
        match self.composition.take() {
            Some(r) => {
                let s = clamp_to_char_boundary(&self.text, r.start);
                let e = clamp_to_char_boundary(&self.text, r.end);
                self.text.replace_range(s..e, &text);
                let pos = s + text.len();
                self.selection = pos..pos;
            }
            None => self.insert_text(&text),
        }
        self.reset_caret_blink();
    }

    pub fn cancel_composition(&mut self) {
        if let Some(r) = self.composition.take() {
            let s = clamp_to_char_boundary(&self.text, r.start);
            let e = clamp_to_char_boundary(&self.text, r.end);
            if s <= e {
                self.text.replace_range(s..e, "");
                self.selection = s..s;
            }
        }
        self.reset_caret_blink();
    }

    /// IME "delete surrounding text", snapped outward to grapheme boundaries.
    pub fn delete_surrounding(&mut self, before_bytes: usize, after_bytes: usize) {
        if !self.selection.is_empty() {
            self.insert_text("");
            return;
        }
        let caret = self.selection.end.min(self.text.len());
        let start = prev_grapheme_boundary(&self.text, caret.saturating_sub(before_bytes) + 1);
        let end_raw = (caret + after_bytes).min(self.text.len());
        let end = if end_raw == caret {
            caret
        } else {
            next_grapheme_boundary(&self.text, end_raw.saturating_sub(1))
        };
        if start < end {
            self.text.replace_range(start..end, "");
            self.selection = start..start;
        }
        self.reset_caret_blink();
    }

    /// Starts a pointer selection. With `extend` the current anchor is kept.
    pub fn begin_drag(&mut self, idx_byte: usize, extend: bool) {
        let idx = clamp_to_char_boundary(&self.text, idx_byte);
        let anchor = if extend {
            self.drag_anchor.unwrap_or(self.selection.start)
        } else {
            idx
        };
        self.selection = anchor.min(idx)..anchor.max(idx);
        self.drag_anchor = Some(anchor);
        self.reset_caret_blink();
    }

    pub fn drag_to(&mut self, idx_byte: usize) {
        if let Some(anchor) = self.drag_anchor {
            let i = clamp_to_char_boundary(&self.text, idx_byte);
            self.selection = anchor.min(i)..anchor.max(i);
        }
        self.reset_caret_blink();
    }

    pub fn end_drag(&mut self) {
        if self.selection.is_empty() {
            self.drag_anchor = None;
        }
    }

    /// The moving end of the selection.
    pub fn caret_index(&self) -> usize {
        match self.drag_anchor {
            Some(a) if a == self.selection.end => self.selection.start,
            _ => self.selection.end,
        }
    }

    /// Scrolls so that `caret_x` stays inside the inner width, 2px inset.
    pub fn ensure_caret_visible(&mut self, caret_x: f32, inner_width: f32) {
        let inset = 2.0;
        let left = self.scroll_offset + inset;
        let right = self.scroll_offset + inner_width - inset;
        if caret_x < left {
            self.scroll_offset = (caret_x - inset).max(0.0);
        } else if caret_x > right {
            self.scroll_offset = (caret_x - inner_width + inset).max(0.0);
        }
    }

    pub fn reset_caret_blink(&mut self) {
        self.blink_start = Instant::now();
    }

    pub fn caret_visible(&self) -> bool {
        const PERIOD: Duration = Duration::from_millis(500);
        (self.blink_start.elapsed().as_millis() / PERIOD.as_millis()) % 2 == 0
    }

    pub fn set_inner_width(&mut self, w: f32) {
        self.inner_width = w.max(0.0);
    }
}

/// Optional parts of a [`TextField`].
#[derive(Clone, Default)]
pub struct TextFieldOptions {
    /// Placeholder shown while the value is empty.
    pub hint: String,
    pub leading: Option<View>,
    /// Key for the platform-held editing state; derived from the hint when 0.
    pub state_key: u64,
}

impl TextFieldOptions {
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }
    pub fn leading(mut self, icon: View) -> Self {
        self.leading = Some(icon);
        self
    }
    pub fn state_key(mut self, key: u64) -> Self {
        self.state_key = key;
        self
    }
}

/// The editable leaf without decoration.
pub fn BasicTextField(
    value: impl Into<String>,
    on_change: impl Fn(String) + 'static,
    modifier: Modifier,
    opts: &TextFieldOptions,
) -> View {
    let state_key = if opts.state_key != 0 {
        opts.state_key
    } else {
        stable_key(&opts.hint)
    };
    View::new(
        0,
        ViewKind::TextField {
            state_key,
            value: value.into(),
            hint: opts.hint.clone(),
            on_change: Some(Rc::new(on_change)),
        },
    )
    .modifier(modifier)
    .semantics(Semantics::new(Role::TextField).label(opts.hint.clone()))
}

/// Filled text field: `surface` container at least 56dp tall with an
/// optional leading icon and a placeholder.
pub fn TextField(
    value: impl Into<String>,
    on_change: impl Fn(String) + 'static,
    modifier: Modifier,
    opts: TextFieldOptions,
) -> View {
    let th = theme();
    let field = BasicTextField(
        value,
        on_change,
        Modifier::new().weight(1.0),
        &opts,
    );
    let leading = opts.leading.clone().map(|icon| {
        crate::Box(
            Modifier::new()
                .size(48.0, 48.0)
                .margin_values(PaddingValues {
                    left: 4.0,
                    ..PaddingValues::ZERO
                })
                .justify_content(JustifyContent::Center)
                .align_items(AlignItems::Center),
        )
        .child(icon)
    });

    Row(Modifier::new()
        .min_height(TF_MIN_HEIGHT)
        .background(th.surface)
        .clip_rounded(shapes().small)
        .align_items(AlignItems::Center)
        .then(modifier))
    .child((leading, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_appends_and_moves_caret() {
        let mut state = TextFieldState::new();
        state.insert_text("Hello");
        assert_eq!(state.text, "Hello");
        assert_eq!(state.selection, 5..5);
    }

    #[test]
    fn delete_backward_removes_one_char() {
        let mut state = TextFieldState::new();
        state.insert_text("Hello");
        state.delete_backward();
        assert_eq!(state.text, "Hell");
        assert_eq!(state.selection, 4..4);
    }

    #[test]
    fn typing_replaces_selection() {
        let mut state = TextFieldState::new();
        state.insert_text("Hello World");
        state.selection = 0..5;
        state.insert_text("Hi");
        assert_eq!(state.text, "Hi World");
        assert_eq!(state.selection, 2..2);
    }

    #[test]
    fn ime_preedit_then_commit() {
        let mut state = TextFieldState::new();
        state.insert_text("Yoga ");
        state.set_composition("ストレ".to_string(), Some((3, 3)));
        assert_eq!(state.text, "Yoga ストレ");
        assert!(state.composition.is_some());

        state.commit_composition("ストレッチ".to_string());
        assert_eq!(state.text, "Yoga ストレッチ");
        assert!(state.composition.is_none());
        assert_eq!(state.caret_index(), state.text.len());
    }

    #[test]
    fn cancel_composition_restores_text() {
        let mut state = TextFieldState::new();
        state.insert_text("ab");
        state.set_composition("xy".into(), None);
        assert_eq!(state.text, "abxy");
        state.cancel_composition();
        assert_eq!(state.text, "ab");
        assert_eq!(state.selection, 2..2);
    }

    #[test]
    fn cursor_movement_and_shift_extend() {
        let mut state = TextFieldState::new();
        state.insert_text("Hello");
        state.move_cursor(-2, false);
        assert_eq!(state.selection, 3..3);
        state.move_cursor(1, false);
        assert_eq!(state.selection, 4..4);

        state.move_cursor(-3, true);
        assert_eq!(state.selection, 1..4);
        assert_eq!(state.selected_text(), "ell");
    }

    #[test]
    fn delete_surrounding_around_caret() {
        let mut state = TextFieldState::new();
        state.insert_text("Hello");
        state.move_cursor(-1, false);
        state.delete_surrounding(2, 1);
        assert_eq!(state.text, "He");
        assert_eq!(state.selection, 2..2);
    }

    #[test]
    fn grapheme_delete_and_move() {
        let mut st = TextFieldState::new();
        st.insert_text("A👍🏽B");
        st.move_cursor(-1, false);
        assert_eq!(st.selection.end, "A👍🏽".len());
        st.delete_backward();
        assert_eq!(st.text, "AB");
        assert_eq!(st.selection, 1..1);
    }

    #[test]
    fn controlled_value_clamps_caret() {
        let mut st = TextFieldState::new();
        st.insert_text("stretching");
        st.set_text("");
        assert_eq!(st.text, "");
        assert_eq!(st.selection, 0..0);

        st.set_text("yo");
        st.selection = 1..2;
        st.set_text("y");
        assert_eq!(st.selection, 1..1);
    }

    #[test]
    fn select_all_then_type() {
        let mut st = TextFieldState::new();
        st.insert_text("abc");
        st.select_all();
        assert_eq!(st.selected_text(), "abc");
        st.insert_text("z");
        assert_eq!(st.text, "z");
    }

    #[test]
    fn drag_selects_between_anchor_and_pointer() {
        let mut st = TextFieldState::new();
        st.insert_text("abcdef");
        st.begin_drag(4, false);
        st.drag_to(1);
        assert_eq!(st.selection, 1..4);
        assert_eq!(st.caret_index(), 1);
        st.end_drag();
        st.begin_drag(2, false);
        st.end_drag();
        assert_eq!(st.drag_anchor, None);
    }

    #[test]
    fn caret_scrolls_into_view() {
        let mut st = TextFieldState::new();
        st.ensure_caret_visible(150.0, 100.0);
        assert_eq!(st.scroll_offset, 52.0);
        st.ensure_caret_visible(10.0, 100.0);
        assert_eq!(st.scroll_offset, 8.0);
    }

    #[test]
    fn index_for_x_lands_on_grapheme_boundaries() {
        let t = "A👍🏽B";
        let m = measure_text(t, 16.0);
        for &b in &m.byte_offsets {
            assert!(t.is_char_boundary(b));
        }
        assert_eq!(index_for_x_bytes(t, 16.0, -5.0), 0);
        assert_eq!(index_for_x_bytes(t, 16.0, 1e6), t.len());
        assert_eq!(byte_to_char_index(&m, t.len()), m.byte_offsets.len() - 1);
    }
}
