use layoutlab_core::*;
use layoutlab_ui::Interactions;
use layoutlab_ui::TextFieldStates;
use layoutlab_ui::layout_and_paint;

/// Top-most hit region under `pos` (hit regions are sorted by z, so the last
/// match wins).
pub fn top_hit_index(frame: &Frame, pos: Vec2) -> Option<usize> {
    frame
        .hit_regions
        .iter()
        .enumerate()
        .rev()
        .find(|(_, h)| h.rect.contains(pos))
        .map(|(i, _)| i)
}

pub fn hit_index_by_id(frame: &Frame, id: u64) -> Option<usize> {
    frame.hit_regions.iter().position(|h| h.id == id)
}

/// Offers the scroll delta to every scroll consumer under `pos`, top-most
/// first, and stops at the first one that consumes part of it. Nested
/// scroll areas on different axes thus each get their own direction.
pub fn dispatch_scroll(frame: &Frame, pos: Vec2, delta: Vec2) -> bool {
    let mut remaining = delta;
    let mut consumed_any = false;
    for hit in frame
        .hit_regions
        .iter()
        .rev()
        .filter(|h| h.rect.contains(pos))
    {
        let Some(cb) = &hit.on_scroll else { continue };
        let leftover = cb(remaining);
        let consumed_x = (remaining.x - leftover.x).abs() > 0.001;
        let consumed_y = (remaining.y - leftover.y).abs() > 0.001;
        if consumed_x || consumed_y {
            consumed_any = true;
            remaining = leftover;
            if remaining.x.abs() < 0.001 && remaining.y.abs() < 0.001 {
                break;
            }
        }
    }
    consumed_any
}

/// Next id in the focus chain, wrapping at both ends. With nothing focused,
/// forward traversal starts at the first entry and backward at the last.
pub fn next_focus(chain: &[u64], current: Option<u64>, backwards: bool) -> Option<u64> {
    if chain.is_empty() {
        return None;
    }
    let n = chain.len();
    let idx = current.and_then(|c| chain.iter().position(|&id| id == c));
    let next = match (idx, backwards) {
        (Some(i), false) => (i + 1) % n,
        (Some(i), true) => (i + n - 1) % n,
        (None, false) => 0,
        (None, true) => n - 1,
    };
    Some(chain[next])
}

/// Input for a single-line field: tabs become spaces, newlines and other
/// control characters are dropped.
pub fn sanitize_single_line(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Drops editing state for text fields that are no longer on screen, so a
/// field that leaves and re-enters the tree starts fresh.
pub fn prune_textfield_states(states: &mut TextFieldStates, frame: &Frame) {
    let live: std::collections::HashSet<u64> = frame
        .hit_regions
        .iter()
        .filter_map(|h| h.tf_state_key)
        .collect();
    states.retain(|k, _| live.contains(k));
}

/// Runs one composition + layout pass with the runner's density and insets
/// installed as composition locals.
pub fn compose_frame(
    sched: &mut Scheduler,
    root: &mut dyn FnMut(&mut Scheduler) -> View,
    scale: f32,
    insets: WindowInsets,
    interactions: &Interactions,
    textfield_states: &TextFieldStates,
) -> Frame {
    let focused = sched.focused;
    with_density(Density { scale }, || {
        with_window_insets(insets, || {
            sched.compose(
                |s| root(s),
                |view, size| layout_and_paint(view, size, textfield_states, interactions, focused),
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn frame_with(hits: Vec<HitRegion>) -> Frame {
        Frame {
            root: View::new(0, ViewKind::Box),
            scene: Scene::default(),
            focus_chain: hits.iter().filter(|h| h.focusable).map(|h| h.id).collect(),
            hit_regions: hits,
            semantics_nodes: Vec::new(),
        }
    }

    #[test]
    fn focus_traversal_wraps() {
        let chain = [3, 7, 9];
        assert_eq!(next_focus(&chain, None, false), Some(3));
        assert_eq!(next_focus(&chain, None, true), Some(9));
        assert_eq!(next_focus(&chain, Some(9), false), Some(3));
        assert_eq!(next_focus(&chain, Some(3), true), Some(9));
        assert_eq!(next_focus(&chain, Some(42), false), Some(3));
        assert_eq!(next_focus(&[], Some(3), false), None);
    }

    #[test]
    fn single_line_input_drops_newlines() {
        assert_eq!(sanitize_single_line("yo\r\nga"), "yoga");
        assert_eq!(sanitize_single_line("a\tb"), "a b");
        assert_eq!(sanitize_single_line("é👍🏽\u{7}x"), "é👍🏽x");
    }

    #[test]
    fn scroll_goes_to_topmost_consumer_first() {
        let outer_hits = Rc::new(Cell::new(0));
        let inner_hits = Rc::new(Cell::new(0));

        let mut outer = HitRegion::new(1, Rect::new(0.0, 0.0, 100.0, 100.0));
        let o = outer_hits.clone();
        // Vertical only.
        outer.on_scroll = Some(Rc::new(move |d: Vec2| {
            o.set(o.get() + 1);
            Vec2::new(d.x, 0.0)
        }));
        let mut inner = HitRegion::new(2, Rect::new(0.0, 0.0, 100.0, 50.0));
        let i = inner_hits.clone();
        // Horizontal only.
        inner.on_scroll = Some(Rc::new(move |d: Vec2| {
            i.set(i.get() + 1);
            Vec2::new(0.0, d.y)
        }));
        let frame = frame_with(vec![outer, inner]);

        assert!(dispatch_scroll(&frame, Vec2::new(10.0, 10.0), Vec2::new(5.0, 0.0)));
        assert_eq!((inner_hits.get(), outer_hits.get()), (1, 0));

        assert!(dispatch_scroll(&frame, Vec2::new(10.0, 10.0), Vec2::new(0.0, 5.0)));
        assert_eq!((inner_hits.get(), outer_hits.get()), (2, 1));

        assert!(!dispatch_scroll(&frame, Vec2::new(10.0, 200.0), Vec2::new(0.0, 5.0)));
    }

    #[test]
    fn pruning_keeps_only_live_fields() {
        let mut hit = HitRegion::new(5, Rect::new(0.0, 0.0, 10.0, 10.0));
        hit.tf_state_key = Some(77);
        let frame = frame_with(vec![hit]);
        let mut states = TextFieldStates::new();
        states.insert(77, Default::default());
        states.insert(78, Default::default());
        prune_textfield_states(&mut states, &frame);
        assert!(states.contains_key(&77));
        assert!(!states.contains_key(&78));
    }
}
