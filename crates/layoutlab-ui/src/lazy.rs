//! Virtualized horizontal containers.
//!
//! Both containers compose only the items that intersect the viewport (plus
//! a small buffer) once the viewport width is known, and pad the skipped
//! ranges with spacers so the total content width never changes. The
//! logical item count is always reported through the view's semantics.

use std::ops::Range;
use std::rc::Rc;

use layoutlab_core::*;

use crate::scroll::ScrollState;
use crate::{Column, Row, ViewExt};

/// Items kept composed on each side of the visible range.
const BUFFER_ITEMS: usize = 2;

/// Scroll position of a lazy container, in px along its main axis.
#[derive(Default)]
pub struct LazyListState {
    scroll: Rc<ScrollState>,
}

impl LazyListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll(&self) -> &Rc<ScrollState> {
        &self.scroll
    }

    pub fn offset(&self) -> f32 {
        self.scroll.offset()
    }
}

pub fn remember_lazy_list_state(key: impl Into<String>) -> Rc<LazyListState> {
    remember_with_key(key.into(), LazyListState::new)
}

/// Geometry shared by [`LazyRow`] and [`LazyHorizontalGrid`] (dp).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LazyListSpec {
    /// Padding around the whole content, inside the scroll area.
    pub content_padding: PaddingValues,
    /// Gap between items (or grid columns) along the scroll axis.
    pub spacing: f32,
    /// Gap between grid rows.
    pub cross_spacing: f32,
    /// Main-axis extent of every item. Without it nothing is virtualized.
    pub item_extent: Option<f32>,
}

impl LazyListSpec {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn content_padding(mut self, p: PaddingValues) -> Self {
        self.content_padding = p;
        self
    }
    pub fn spacing(mut self, gap: f32) -> Self {
        self.spacing = gap;
        self
    }
    pub fn cross_spacing(mut self, gap: f32) -> Self {
        self.cross_spacing = gap;
        self
    }
    pub fn item_extent(mut self, extent: f32) -> Self {
        self.item_extent = Some(extent);
        self
    }
}

/// Indices to compose for a scroll position. All lengths are px.
///
/// Returns `0..count` when the viewport has not been measured yet or the item
/// extent is unknown.
pub fn visible_range(
    count: usize,
    extent: Option<f32>,
    spacing: f32,
    leading_padding: f32,
    offset: f32,
    viewport: f32,
    buffer: usize,
) -> Range<usize> {
    let Some(extent) = extent else {
        return 0..count;
    };
    let stride = extent + spacing;
    if viewport <= 0.0 || stride <= 0.0 {
        return 0..count;
    }
    let start = ((offset - leading_padding) / stride).floor().max(0.0) as usize;
    let end = ((offset + viewport - leading_padding) / stride).ceil().max(0.0) as usize;
    let start = start.saturating_sub(buffer).min(count);
    let end = end.saturating_add(buffer).min(count);
    start..end.max(start)
}

/// Stand-in for `n` skipped items. Each item carries one gap and the row
/// adds the gaps around the spacer itself, hence the `- spacing`.
fn skipped(n: usize, extent: f32, spacing: f32) -> Option<View> {
    (n > 0).then(|| {
        let w = n as f32 * (extent + spacing) - spacing;
        crate::Box(Modifier::new().width(w.max(0.0)).height(1.0))
    })
}

fn composed_range(count: usize, state: &LazyListState, spec: &LazyListSpec) -> Range<usize> {
    let scroll = state.scroll();
    visible_range(
        count,
        spec.item_extent.map(dp_to_px),
        dp_to_px(spec.spacing),
        dp_to_px(spec.content_padding.left),
        scroll.offset(),
        scroll.viewport(),
        BUFFER_ITEMS,
    )
}

fn lazy_scroll_area(
    state: &LazyListState,
    modifier: Modifier,
    semantics: Semantics,
    content: View,
) -> View {
    View::new(0, ViewKind::ScrollH(state.scroll().hooks(true)))
        .modifier(modifier)
        .semantics(semantics)
        .with_children(vec![content])
}

/// Horizontally scrolling single-row list of `count` items.
pub fn LazyRow(
    count: usize,
    state: Rc<LazyListState>,
    spec: LazyListSpec,
    modifier: Modifier,
    item: impl Fn(usize) -> View,
) -> View {
    let range = composed_range(count, &state, &spec);
    let extent = spec.item_extent.unwrap_or(0.0);

    let mut children = Vec::with_capacity(range.len() + 2);
    children.extend(skipped(range.start, extent, spec.spacing));
    children.extend(range.clone().map(&item));
    children.extend(skipped(count - range.end, extent, spec.spacing));

    let content = Row(Modifier::new()
        .padding_values(spec.content_padding)
        .spacing(spec.spacing))
    .child(children);

    lazy_scroll_area(
        &state,
        modifier,
        Semantics::new(Role::List).collection(CollectionInfo {
            rows: 1,
            columns: count,
            item_count: count,
        }),
        content,
    )
}

/// Column-major cell placement: `(row, column)` of item `index`.
pub fn grid_cell(index: usize, rows: usize) -> (usize, usize) {
    let rows = rows.max(1);
    (index % rows, index / rows)
}

/// Horizontally scrolling grid with a fixed number of rows. Items fill
/// column by column; more items add columns, never rows. `item_extent` is the
/// column width.
pub fn LazyHorizontalGrid(
    rows: usize,
    count: usize,
    state: Rc<LazyListState>,
    spec: LazyListSpec,
    modifier: Modifier,
    item: impl Fn(usize) -> View,
) -> View {
    let rows = rows.max(1);
    let columns = count.div_ceil(rows);
    let range = composed_range(columns, &state, &spec);
    let extent = spec.item_extent.unwrap_or(0.0);

    // Every column keeps `rows` cells; the last one may leave some empty.
    let column = |c: usize| -> View {
        let mut cells: Vec<View> = (0..rows).map(|_| Row(Modifier::new().weight(1.0))).collect();
        for index in c * rows..((c + 1) * rows).min(count) {
            let (r, _) = grid_cell(index, rows);
            cells[r].children.push(item(index));
        }
        Column(Modifier::new().spacing(spec.cross_spacing)).child(cells)
    };

    let mut children = Vec::with_capacity(range.len() + 2);
    children.extend(skipped(range.start, extent, spec.spacing));
    children.extend(range.clone().map(column));
    children.extend(skipped(columns - range.end, extent, spec.spacing));

    let content = Row(Modifier::new()
        .padding_values(spec.content_padding)
        .spacing(spec.spacing))
    .child(children);

    lazy_scroll_area(
        &state,
        modifier,
        Semantics::new(Role::Grid).collection(CollectionInfo {
            rows,
            columns,
            item_count: count,
        }),
        content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Text;

    fn labels(v: &View) -> Vec<String> {
        let mut out = vec![];
        v.visit(&mut |n| {
            if let Some(t) = n.text() {
                out.push(t.to_string());
            }
        });
        out
    }

    #[test]
    fn unmeasured_viewport_composes_everything() {
        assert_eq!(visible_range(10, Some(88.0), 8.0, 16.0, 0.0, 0.0, 2), 0..10);
        assert_eq!(visible_range(10, None, 8.0, 16.0, 0.0, 300.0, 2), 0..10);
        assert_eq!(visible_range(0, Some(88.0), 8.0, 16.0, 0.0, 300.0, 2), 0..0);
    }

    #[test]
    fn range_follows_offset_with_buffer() {
        // stride 100, viewport shows items 3..6
        assert_eq!(visible_range(50, Some(92.0), 8.0, 0.0, 300.0, 300.0, 0), 3..6);
        assert_eq!(visible_range(50, Some(92.0), 8.0, 0.0, 300.0, 300.0, 2), 1..8);
        assert_eq!(visible_range(5, Some(92.0), 8.0, 0.0, 300.0, 300.0, 2), 1..5);
    }

    #[test]
    fn lazy_row_reports_logical_count() {
        let state = Rc::new(LazyListState::new());
        let spec = LazyListSpec::new().spacing(8.0).item_extent(88.0);
        let v = LazyRow(10, state, spec, Modifier::new(), |i| Text(format!("{i}")));

        assert_eq!(labels(&v).len(), 10);
        let info = v.semantics.as_ref().and_then(|s| s.collection);
        assert_eq!(
            info,
            Some(CollectionInfo {
                rows: 1,
                columns: 10,
                item_count: 10
            })
        );
    }

    #[test]
    fn lazy_row_skips_offscreen_items_and_keeps_width() {
        let state = Rc::new(LazyListState::new());
        state.scroll().set_viewport(200.0);
        state.scroll().set_content(100.0 * 40.0);
        state.scroll().set_offset(1000.0);
        let spec = LazyListSpec::new().spacing(8.0).item_extent(92.0);
        let v = LazyRow(40, state, spec, Modifier::new(), |i| Text(format!("{i}")));

        let shown = labels(&v);
        assert_eq!(shown.first().map(String::as_str), Some("8"));
        assert_eq!(shown.last().map(String::as_str), Some("13"));

        let row = &v.children[0];
        assert_eq!(row.children[0].modifier.width, Some(8.0 * 100.0 - 8.0));
        let trailing = row.children.last().and_then(|c| c.modifier.width);
        assert_eq!(trailing, Some(26.0 * 100.0 - 8.0));
    }

    #[test]
    fn grid_fills_columns_first() {
        assert_eq!(grid_cell(0, 2), (0, 0));
        assert_eq!(grid_cell(1, 2), (1, 0));
        assert_eq!(grid_cell(2, 2), (0, 1));
        assert_eq!(grid_cell(9, 2), (1, 4));
    }

    fn outline(v: &View) -> String {
        fn go(v: &View, depth: usize, out: &mut Vec<String>) {
            let mut line = format!("{}{}", "  ".repeat(depth), v.kind.name());
            if let Some(t) = v.text() {
                line.push_str(&format!(" {t:?}"));
            }
            out.push(line);
            for c in &v.children {
                go(c, depth + 1, out);
            }
        }
        let mut out = vec![];
        go(v, 0, &mut out);
        out.join("\n")
    }

    #[test]
    fn odd_count_leaves_last_cell_empty() {
        let state = Rc::new(LazyListState::new());
        let v = LazyHorizontalGrid(2, 3, state, LazyListSpec::new(), Modifier::new(), |i| {
            Text(format!("{i}"))
        });
        insta::assert_snapshot!(outline(&v), @r#"
        ScrollH
          Row
            Column
              Row
                Text "0"
              Row
                Text "1"
            Column
              Row
                Text "2"
              Row
        "#);
    }

    #[test]
    fn grid_always_has_requested_rows() {
        for count in [1usize, 2, 3, 10, 11] {
            let state = Rc::new(LazyListState::new());
            let v = LazyHorizontalGrid(2, count, state, LazyListSpec::new(), Modifier::new(), |i| {
                Text(format!("{i}"))
            });
            let row = &v.children[0];
            assert_eq!(row.children.len(), count.div_ceil(2));
            for col in &row.children {
                assert_eq!(col.children.len(), 2);
            }
            for i in 0..count {
                let (r, c) = grid_cell(i, 2);
                assert_eq!(row.children[c].children[r].children[0].text(), Some(&*i.to_string()));
            }
            assert_eq!(labels(&v).len(), count);
        }
    }
}
