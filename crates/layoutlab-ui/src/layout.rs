//! Layout and paint.
//!
//! `layout_and_paint` stamps ids onto a copy of the view tree, mirrors it
//! into a `TaffyTree`, computes layout in physical pixels and walks the
//! result to emit scene nodes, hit regions and semantics nodes.
//!
//! Modifier lengths are dp, text sizes are sp; both are converted with the
//! current `Density` (and `TextScale` for text) before reaching taffy.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use layoutlab_core::*;
use taffy::geometry::{Line, Point, Rect as TRect, Size as TSize};
use taffy::style::{AvailableSpace, Display, FlexDirection, Overflow, Position, Style};
use taffy::style_helpers::{auto, length, line, percent, span};
use taffy::{NodeId, TaffyTree};

use crate::Interactions;
use crate::textfield::{
    TF_MIN_HEIGHT, TF_PADDING_X, TextFieldState, byte_to_char_index, field_font_px, measure_text,
};

/// Platform-held editing state, keyed by `ViewKind::TextField::state_key`.
pub type TextFieldStates = HashMap<u64, Rc<RefCell<TextFieldState>>>;

const DEFAULT_TEXTFIELD_WIDTH: f32 = 220.0;
const SCROLLBAR_THICKNESS: f32 = 4.0;
const SCROLLBAR_MARGIN: f32 = 2.0;
const SCROLLBAR_MIN_THUMB: f32 = 24.0;

#[derive(Clone, Debug)]
enum NodeCtx {
    Text {
        /// Natural single-line width (px).
        width: f32,
        line_height: f32,
        /// Text may shrink below its natural width.
        shrinkable: bool,
    },
    TextField {
        width: f32,
        height: f32,
    },
    Image {
        width: f32,
        height: f32,
    },
    Container,
}

fn layout_err(e: taffy::TaffyError) -> UiError {
    UiError::Layout(e.to_string())
}

fn font_px(sp: f32) -> f32 {
    dp_to_px(sp) * text_scale().0
}

fn pad_px(p: PaddingValues) -> PaddingValues {
    PaddingValues {
        left: dp_to_px(p.left),
        right: dp_to_px(p.right),
        top: dp_to_px(p.top),
        bottom: dp_to_px(p.bottom),
    }
}

/// Padding in px, including what `padding_from_baseline` adds on text.
fn effective_padding(v: &View) -> PaddingValues {
    let mut p = v.modifier.padding.map(pad_px).unwrap_or_default();
    if let (Some(bp), ViewKind::Text { font_size, line_height, .. }) =
        (v.modifier.padding_from_baseline, &v.kind)
    {
        let m = layoutlab_text::line_metrics(font_px(*font_size), line_height.map(font_px));
        if let Some(top) = bp.top {
            p.top += (dp_to_px(top) - m.baseline).max(0.0);
        }
        if let Some(bottom) = bp.bottom {
            p.bottom += (dp_to_px(bottom) - (m.line_height - m.baseline)).max(0.0);
        }
    }
    p
}

fn is_row_like(kind: &ViewKind) -> bool {
    matches!(kind, ViewKind::Row | ViewKind::ScrollH(_))
}

fn is_scroll(kind: &ViewKind) -> bool {
    matches!(kind, ViewKind::ScrollV(_) | ViewKind::ScrollH(_))
}

fn style_for(v: &View, padding: PaddingValues, parent: Option<&ViewKind>) -> Style {
    let m = &v.modifier;
    let kind = &v.kind;
    let mut s = Style::default();

    s.display = if matches!(kind, ViewKind::Stack) {
        Display::Grid
    } else {
        Display::Flex
    };
    s.flex_direction = if is_row_like(kind) {
        if text_direction() == TextDirection::Rtl {
            FlexDirection::RowReverse
        } else {
            FlexDirection::Row
        }
    } else {
        FlexDirection::Column
    };

    let container = matches!(
        kind,
        ViewKind::Row
            | ViewKind::Column
            | ViewKind::Stack
            | ViewKind::Surface
            | ViewKind::Box
            | ViewKind::ScrollV(_)
            | ViewKind::ScrollH(_)
    );
    s.align_items = Some(if container {
        AlignItems::Stretch
    } else {
        AlignItems::FlexStart
    });
    s.justify_content = Some(JustifyContent::FlexStart);
    if let Some(a) = m.align_items {
        s.align_items = Some(a);
    }
    if let Some(j) = m.justify_content {
        s.justify_content = Some(j);
    }
    if let Some(gap) = m.spacing {
        let g = length(dp_to_px(gap));
        s.gap = TSize {
            width: g,
            height: g,
        };
    }

    if let Some(g) = m.flex_grow {
        s.flex_grow = g;
    }
    if let Some(sh) = m.flex_shrink {
        s.flex_shrink = sh;
    }
    if let Some(a) = m.align_self {
        s.align_self = Some(a);
    }

    let absolute = matches!(m.position_type, Some(PositionType::Absolute));
    if absolute {
        s.position = Position::Absolute;
        let inset = |v: Option<f32>| v.map(|d| length(dp_to_px(d))).unwrap_or_else(auto);
        s.inset = TRect {
            left: inset(m.offset_left),
            right: inset(m.offset_right),
            top: inset(m.offset_top),
            bottom: inset(m.offset_bottom),
        };
    } else if matches!(parent, Some(ViewKind::Stack)) {
        s.grid_row = Line {
            start: line(1),
            end: span(1),
        };
        s.grid_column = Line {
            start: line(1),
            end: span(1),
        };
    }

    if is_scroll(kind) {
        s.overflow = Point {
            x: Overflow::Hidden,
            y: Overflow::Hidden,
        };
    }
    // Content of a scroll container keeps its natural size.
    if parent.is_some_and(is_scroll) {
        s.flex_shrink = 0.0;
    }

    s.padding = TRect {
        left: length(padding.left),
        right: length(padding.right),
        top: length(padding.top),
        bottom: length(padding.bottom),
    };
    if let Some(mg) = m.margin.map(pad_px) {
        s.margin = TRect {
            left: length(mg.left),
            right: length(mg.right),
            top: length(mg.top),
            bottom: length(mg.bottom),
        };
    }

    let mut width_set = false;
    let mut height_set = false;
    if let Some(sz) = m.size {
        s.size.width = length(dp_to_px(sz.width.max(0.0)));
        s.size.height = length(dp_to_px(sz.height.max(0.0)));
        width_set = true;
        height_set = true;
    }
    if let Some(w) = m.width {
        s.size.width = length(dp_to_px(w.max(0.0)));
        width_set = true;
    }
    if let Some(h) = m.height {
        s.size.height = length(dp_to_px(h.max(0.0)));
        height_set = true;
    }

    // Fill along the parent's main axis grows like a weight, fill across it
    // is pinned to 100%.
    let parent_is_row = parent.is_some_and(is_row_like);
    let fill_w = (m.fill_max || m.fill_max_w) && !width_set;
    let fill_h = (m.fill_max || m.fill_max_h) && !height_set;
    let parent_is_grid = matches!(parent, Some(ViewKind::Stack)) || parent.is_none() || absolute;
    if parent_is_grid {
        if fill_w {
            s.size.width = percent(1.0);
        }
        if fill_h {
            s.size.height = percent(1.0);
        }
    } else {
        let (main_fill, cross_fill) = if parent_is_row {
            (fill_w, fill_h)
        } else {
            (fill_h, fill_w)
        };
        if main_fill {
            s.flex_grow = s.flex_grow.max(1.0);
            s.flex_shrink = s.flex_shrink.max(1.0);
            s.flex_basis = length(0.0);
            if parent_is_row {
                s.min_size.width = length(0.0);
            } else {
                s.min_size.height = length(0.0);
            }
        }
        if cross_fill {
            if parent_is_row {
                s.min_size.height = percent(1.0);
                s.max_size.height = percent(1.0);
            } else {
                s.min_size.width = percent(1.0);
                s.max_size.width = percent(1.0);
            }
        }
    }

    if let Some(v) = m.min_width {
        s.min_size.width = length(dp_to_px(v.max(0.0)));
    }
    if let Some(v) = m.min_height {
        s.min_size.height = length(dp_to_px(v.max(0.0)));
    }
    if let Some(v) = m.max_width {
        s.max_size.width = length(dp_to_px(v.max(0.0)));
    }
    if let Some(v) = m.max_height {
        s.max_size.height = length(dp_to_px(v.max(0.0)));
    }

    s
}

struct Builder {
    taffy: TaffyTree<NodeCtx>,
    nodes: HashMap<ViewId, NodeId>,
    paddings: HashMap<ViewId, PaddingValues>,
}

impl Builder {
    fn build(&mut self, v: &View, parent: Option<&ViewKind>) -> Result<NodeId, UiError> {
        let padding = effective_padding(v);
        let style = style_for(v, padding, parent);

        let node = match &v.kind {
            ViewKind::Text {
                text,
                font_size,
                weight,
                line_height,
                overflow,
                ..
            } => {
                let px = font_px(*font_size);
                let lh = layoutlab_text::line_metrics(px, line_height.map(font_px)).line_height;
                let ctx = NodeCtx::Text {
                    width: layoutlab_text::measure_line(text, px, weight.0).ceil(),
                    line_height: lh,
                    shrinkable: *overflow != TextOverflow::Visible,
                };
                self.taffy.new_leaf_with_context(style, ctx).map_err(layout_err)?
            }
            ViewKind::TextField { .. } => {
                let ctx = NodeCtx::TextField {
                    width: dp_to_px(DEFAULT_TEXTFIELD_WIDTH),
                    height: dp_to_px(TF_MIN_HEIGHT),
                };
                self.taffy.new_leaf_with_context(style, ctx).map_err(layout_err)?
            }
            ViewKind::Image { handle, .. } => {
                let (width, height) = image(*handle)
                    .map(|src| (dp_to_px(src.width as f32), dp_to_px(src.height as f32)))
                    .unwrap_or((0.0, 0.0));
                self.taffy
                    .new_leaf_with_context(style, NodeCtx::Image { width, height })
                    .map_err(layout_err)?
            }
            kind => {
                let children = v
                    .children
                    .iter()
                    .map(|c| self.build(c, Some(kind)))
                    .collect::<Result<Vec<_>, _>>()?;
                let n = self
                    .taffy
                    .new_with_children(style, &children)
                    .map_err(layout_err)?;
                self.taffy
                    .set_node_context(n, Some(NodeCtx::Container))
                    .map_err(layout_err)?;
                n
            }
        };

        self.nodes.insert(v.id, node);
        self.paddings.insert(v.id, padding);
        Ok(node)
    }
}

fn stamp(mut v: View, id: &mut u64) -> View {
    v.id = *id;
    *id += 1;
    v.children = v.children.into_iter().map(|c| stamp(c, id)).collect();
    v
}

/// Lays out and paints `root` into a `size_px` surface. Layout failures are
/// logged and produce an empty scene.
pub fn layout_and_paint(
    root: &View,
    size_px: (u32, u32),
    textfield_states: &TextFieldStates,
    interactions: &Interactions,
    focused: Option<u64>,
) -> (Scene, Vec<HitRegion>, Vec<SemNode>) {
    match try_layout_and_paint(root, size_px, textfield_states, interactions, focused) {
        Ok(out) => out,
        Err(e) => {
            log::error!("layout failed: {e}");
            let scene = Scene {
                clear_color: theme().background,
                nodes: vec![],
            };
            (scene, vec![], vec![])
        }
    }
}

pub fn try_layout_and_paint(
    root: &View,
    size_px: (u32, u32),
    textfield_states: &TextFieldStates,
    interactions: &Interactions,
    focused: Option<u64>,
) -> Result<(Scene, Vec<HitRegion>, Vec<SemNode>), UiError> {
    let mut next_id = 1u64;
    let root = stamp(root.clone(), &mut next_id);

    let mut b = Builder {
        taffy: TaffyTree::new(),
        nodes: HashMap::new(),
        paddings: HashMap::new(),
    };
    let root_node = b.build(&root, None)?;

    let (w, h) = (size_px.0 as f32, size_px.1 as f32);
    let mut rs = b.taffy.style(root_node).map_err(layout_err)?.clone();
    rs.size = TSize {
        width: length(w),
        height: length(h),
    };
    b.taffy.set_style(root_node, rs).map_err(layout_err)?;

    let available = TSize {
        width: AvailableSpace::Definite(w),
        height: AvailableSpace::Definite(h),
    };
    b.taffy
        .compute_layout_with_measure(root_node, available, |known, avail, _node, ctx, _style| {
            let natural = match ctx {
                Some(NodeCtx::Text {
                    width,
                    line_height,
                    shrinkable,
                }) => {
                    let width = if *shrinkable && avail.width == AvailableSpace::MinContent {
                        0.0
                    } else {
                        *width
                    };
                    TSize {
                        width,
                        height: *line_height,
                    }
                }
                Some(NodeCtx::TextField { width, height }) => TSize {
                    width: *width,
                    height: *height,
                },
                Some(NodeCtx::Image { width, height }) => TSize {
                    width: *width,
                    height: *height,
                },
                Some(NodeCtx::Container) | None => TSize::ZERO,
            };
            TSize {
                width: known.width.unwrap_or(natural.width),
                height: known.height.unwrap_or(natural.height),
            }
        })
        .map_err(layout_err)?;

    let mut p = Painter {
        taffy: &b.taffy,
        nodes: &b.nodes,
        paddings: &b.paddings,
        textfield_states,
        interactions,
        focused,
        scene: Scene {
            clear_color: theme().background,
            nodes: vec![],
        },
        hits: vec![],
        sems: vec![],
    };
    p.walk(&root, (0.0, 0.0))?;

    let Painter {
        scene,
        mut hits,
        sems,
        ..
    } = p;
    hits.sort_by(|a, b| a.z_index.total_cmp(&b.z_index));
    Ok((scene, hits, sems))
}

/// Furthest extent (w, h) reached by `node` or any descendant, relative to
/// the node's own origin.
fn subtree_extents(node: NodeId, t: &TaffyTree<NodeCtx>) -> Result<(f32, f32), UiError> {
    let l = t.layout(node).map_err(layout_err)?;
    let (mut w, mut h) = (l.size.width, l.size.height);
    for ch in t.children(node).map_err(layout_err)? {
        let cl = t.layout(ch).map_err(layout_err)?;
        let (cw, chh) = subtree_extents(ch, t)?;
        w = w.max(cl.location.x + cw);
        h = h.max(cl.location.y + chh);
    }
    Ok((w, h))
}

fn clip_hits(hits: &mut Vec<HitRegion>, from: usize, vp: Rect) {
    let mut i = from;
    while i < hits.len() {
        let r = hits[i].rect.intersect(&vp);
        if r.is_empty() {
            hits.remove(i);
        } else {
            hits[i].rect = r;
            i += 1;
        }
    }
}

/// Normalized source rect for drawing an `iw`×`ih` image into `dst`.
fn crop_uv(iw: f32, ih: f32, dst: Rect) -> [f32; 4] {
    if iw <= 0.0 || ih <= 0.0 || dst.w <= 0.0 || dst.h <= 0.0 {
        return [0.0, 0.0, 1.0, 1.0];
    }
    let img_aspect = iw / ih;
    let dst_aspect = dst.w / dst.h;
    if img_aspect > dst_aspect {
        let f = dst_aspect / img_aspect;
        let u0 = (1.0 - f) * 0.5;
        [u0, 0.0, u0 + f, 1.0]
    } else {
        let f = img_aspect / dst_aspect;
        let v0 = (1.0 - f) * 0.5;
        [0.0, v0, 1.0, v0 + f]
    }
}

fn fit_rect(iw: f32, ih: f32, dst: Rect) -> Rect {
    if iw <= 0.0 || ih <= 0.0 {
        return dst;
    }
    let scale = (dst.w / iw).min(dst.h / ih);
    let (w, h) = (iw * scale, ih * scale);
    Rect::new(dst.x + (dst.w - w) * 0.5, dst.y + (dst.h - h) * 0.5, w, h)
}

struct Painter<'a> {
    taffy: &'a TaffyTree<NodeCtx>,
    nodes: &'a HashMap<ViewId, NodeId>,
    paddings: &'a HashMap<ViewId, PaddingValues>,
    textfield_states: &'a TextFieldStates,
    interactions: &'a Interactions,
    focused: Option<u64>,
    scene: Scene,
    hits: Vec<HitRegion>,
    sems: Vec<SemNode>,
}

impl Painter<'_> {
    fn node(&self, v: &View) -> Result<NodeId, UiError> {
        self.nodes
            .get(&v.id)
            .copied()
            .ok_or_else(|| UiError::Layout(format!("view {} has no layout node", v.id)))
    }

    fn push_sem(&mut self, id: u64, rect: Rect, s: &Semantics) {
        self.sems.push(SemNode {
            id,
            role: s.role,
            label: s.label.clone(),
            rect,
            focused: s.focused || self.focused == Some(id),
            enabled: s.enabled,
            selected: s.selected,
            collection: s.collection,
        });
    }

    fn walk(&mut self, v: &View, parent_origin: (f32, f32)) -> Result<(), UiError> {
        let node = self.node(v)?;
        let l = self.taffy.layout(node).map_err(layout_err)?;
        let rect = Rect::new(
            parent_origin.0 + l.location.x,
            parent_origin.1 + l.location.y,
            l.size.width,
            l.size.height,
        );
        let pad = self.paddings.get(&v.id).copied().unwrap_or_default();
        let content = rect.inset(pad.left, pad.top, pad.right, pad.bottom);
        let scale = density().scale;
        let m = &v.modifier;

        let clip_radius = m.clip.map(|c| c.radius_for(rect, scale)).unwrap_or(0.0);

        if let Some(bg) = m.background {
            self.scene.nodes.push(SceneNode::Rect {
                rect,
                color: bg,
                radius: clip_radius,
            });
        }
        if let Some(b) = &m.border {
            self.scene.nodes.push(SceneNode::Border {
                rect,
                color: b.color,
                width: dp_to_px(b.width),
                radius: dp_to_px(b.radius).max(clip_radius),
            });
        }
        if let Some(paint) = &m.painter {
            paint(&mut self.scene, rect);
        }

        if m.on_click.is_some() {
            let mut hit = HitRegion::new(v.id, rect);
            hit.on_click = m.on_click.clone();
            hit.z_index = m.z_index;
            self.hits.push(hit);

            if self.interactions.pressed.contains(&v.id) {
                self.scene.nodes.push(SceneNode::Rect {
                    rect,
                    color: theme().on_surface.with_alpha(0x1F),
                    radius: clip_radius,
                });
            }
        }
        if let Some(sem) = &v.semantics
            && !matches!(v.kind, ViewKind::TextField { .. })
        {
            self.push_sem(v.id, rect, sem);
        }

        match &v.kind {
            ViewKind::Text {
                text,
                color,
                font_size,
                weight,
                line_height,
                overflow,
            } => {
                self.paint_text(v, content, text, *color, *font_size, *weight, *line_height, *overflow);
                Ok(())
            }
            ViewKind::Image {
                handle,
                content_scale,
                tint,
            } => {
                self.paint_image(content, *handle, *content_scale, *tint, m.clip);
                Ok(())
            }
            ViewKind::TextField {
                state_key,
                value,
                hint,
                on_change,
            } => {
                let mut hit = HitRegion::new(v.id, rect);
                hit.focusable = true;
                hit.z_index = m.z_index;
                hit.on_text_change = on_change.clone();
                hit.tf_state_key = Some(if *state_key != 0 { *state_key } else { v.id });
                hit.tf_value = Some(value.clone());
                self.hits.push(hit);
                self.paint_text_field(v, rect, *state_key, value, hint);
                Ok(())
            }
            ViewKind::ScrollV(hooks) | ViewKind::ScrollH(hooks) => {
                let horizontal = matches!(v.kind, ViewKind::ScrollH(_));
                self.walk_scroll(v, node, rect, pad, hooks, horizontal)
            }
            _ => {
                let clip_children = m.clip.is_some() && !v.children.is_empty();
                if clip_children {
                    self.scene.nodes.push(SceneNode::PushClip {
                        rect,
                        radius: clip_radius,
                    });
                }
                let hit_start = self.hits.len();
                for c in &v.children {
                    self.walk(c, (rect.x, rect.y))?;
                }
                if clip_children {
                    clip_hits(&mut self.hits, hit_start, rect);
                    self.scene.nodes.push(SceneNode::PopClip);
                }
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_text(
        &mut self,
        v: &View,
        content: Rect,
        text: &str,
        color: Option<Color>,
        font_size: f32,
        weight: FontWeight,
        line_height: Option<f32>,
        overflow: TextOverflow,
    ) {
        let px = font_px(font_size);
        let lh = layoutlab_text::line_metrics(px, line_height.map(font_px)).line_height;
        let line_box = Rect::new(
            content.x,
            content.y + ((content.h - lh) * 0.5).max(0.0),
            content.w,
            lh,
        );

        let natural = layoutlab_text::measure_line(text, px, weight.0);
        let too_wide = natural > content.w + 0.5;
        let shown = match overflow {
            TextOverflow::Ellipsis if too_wide => {
                layoutlab_text::ellipsize(text, px, weight.0, content.w)
            }
            _ => text.to_string(),
        };
        let clip = overflow == TextOverflow::Clip && too_wide;

        if clip {
            self.scene.nodes.push(SceneNode::PushClip {
                rect: content,
                radius: 0.0,
            });
        }
        self.scene.nodes.push(SceneNode::Text {
            rect: line_box,
            text: shown,
            color: color.unwrap_or(theme().on_surface),
            size: px,
            weight,
        });
        if clip {
            self.scene.nodes.push(SceneNode::PopClip);
        }

        if v.semantics.is_none() {
            self.push_sem(v.id, content, &Semantics::new(Role::Text).label(text));
        }
    }

    fn paint_image(
        &mut self,
        rect: Rect,
        handle: ImageHandle,
        content_scale: ContentScale,
        tint: Option<Color>,
        clip: Option<Shape>,
    ) {
        let scale = density().scale;
        let Some(src) = image(handle) else {
            let th = theme();
            let radius = clip.map(|c| c.radius_for(rect, scale)).unwrap_or(0.0);
            let stroke = dp_to_px(1.0);
            self.scene.nodes.push(SceneNode::Rect {
                rect,
                color: th.outline.faded(0.35),
                radius,
            });
            self.scene.nodes.push(SceneNode::PushClip { rect, radius });
            let (cx, cy) = (rect.x + rect.w * 0.5, rect.y + rect.h * 0.5);
            self.scene.nodes.push(SceneNode::Rect {
                rect: Rect::new(rect.x, cy - stroke * 0.5, rect.w, stroke),
                color: th.outline,
                radius: 0.0,
            });
            self.scene.nodes.push(SceneNode::Rect {
                rect: Rect::new(cx - stroke * 0.5, rect.y, stroke, rect.h),
                color: th.outline,
                radius: 0.0,
            });
            self.scene.nodes.push(SceneNode::PopClip);
            self.scene.nodes.push(SceneNode::Border {
                rect,
                color: th.outline,
                width: stroke,
                radius,
            });
            return;
        };

        let (iw, ih) = (src.width as f32, src.height as f32);
        let (dst, uv) = match content_scale {
            ContentScale::Crop => (rect, crop_uv(iw, ih, rect)),
            ContentScale::Fit => (fit_rect(iw, ih, rect), [0.0, 0.0, 1.0, 1.0]),
            ContentScale::FillBounds => (rect, [0.0, 0.0, 1.0, 1.0]),
        };
        self.scene.nodes.push(SceneNode::Image {
            rect: dst,
            handle,
            uv,
            radius: clip.map(|c| c.radius_for(dst, scale)).unwrap_or(0.0),
            tint,
        });
    }

    fn paint_text_field(&mut self, v: &View, rect: Rect, state_key: u64, value: &str, hint: &str) {
        let th = theme();
        let key = if state_key != 0 { state_key } else { v.id };
        let is_focused = self.focused == Some(v.id);
        let font = field_font_px();
        let lh = layoutlab_text::line_metrics(font, Some(font_px(typography().body_large.line_height)))
            .line_height;

        let pad_x = dp_to_px(TF_PADDING_X);
        let inner = Rect::new(
            rect.x + pad_x,
            rect.y + ((rect.h - lh) * 0.5).max(0.0),
            (rect.w - 2.0 * pad_x).max(0.0),
            lh.min(rect.h),
        );
        self.scene.nodes.push(SceneNode::PushClip {
            rect: inner,
            radius: 0.0,
        });

        let mut label = value.to_string();
        match self.textfield_states.get(&key) {
            Some(state_rc) => {
                {
                    let mut st = state_rc.borrow_mut();
                    st.set_text(value);
                    st.set_inner_width(inner.w);
                }
                let st = state_rc.borrow();
                let m = measure_text(&st.text, font);
                let x_at = |byte: usize| {
                    m.positions
                        .get(byte_to_char_index(&m, byte))
                        .copied()
                        .unwrap_or(0.0)
                        - st.scroll_offset
                };

                if !st.selection.is_empty() {
                    let (sx, ex) = (x_at(st.selection.start), x_at(st.selection.end));
                    self.scene.nodes.push(SceneNode::Rect {
                        rect: Rect::new(inner.x + sx, inner.y, (ex - sx).max(0.0), inner.h),
                        color: th.primary.with_alpha(0x55),
                        radius: 0.0,
                    });
                }
                if let Some(r) = &st.composition
                    && r.start < r.end
                {
                    let (sx, ex) = (x_at(r.start), x_at(r.end));
                    let uh = dp_to_px(1.5);
                    self.scene.nodes.push(SceneNode::Rect {
                        rect: Rect::new(inner.x + sx, inner.y + inner.h - uh, (ex - sx).max(0.0), uh),
                        color: th.focus,
                        radius: 0.0,
                    });
                }

                self.push_field_text(inner.translate(-st.scroll_offset, 0.0), &st.text, hint, font);

                if is_focused && st.selection.is_empty() && st.caret_visible() {
                    let cx = x_at(st.caret_index());
                    self.scene.nodes.push(SceneNode::Rect {
                        rect: Rect::new(inner.x + cx, inner.y, dp_to_px(2.0), inner.h),
                        color: th.primary,
                        radius: 0.0,
                    });
                }
                label = st.text.clone();
            }
            None => self.push_field_text(inner, value, hint, font),
        }
        self.scene.nodes.push(SceneNode::PopClip);

        if is_focused {
            let bar = dp_to_px(2.0);
            self.scene.nodes.push(SceneNode::Rect {
                rect: Rect::new(rect.x, rect.bottom() - bar, rect.w, bar),
                color: th.focus,
                radius: 0.0,
            });
        }

        let mut sem = v
            .semantics
            .clone()
            .unwrap_or_else(|| Semantics::new(Role::TextField));
        sem.label = Some(if label.is_empty() { hint.to_string() } else { label });
        self.push_sem(v.id, rect, &sem);
    }

    /// Value, or the placeholder when the value is empty.
    fn push_field_text(&mut self, rect: Rect, value: &str, hint: &str, font: f32) {
        let th = theme();
        let (text, color) = if value.is_empty() {
            (hint, th.on_surface_variant)
        } else {
            (value, th.on_surface)
        };
        if text.is_empty() {
            return;
        }
        self.scene.nodes.push(SceneNode::Text {
            rect: Rect::new(rect.x, rect.y, rect.w.max(0.0), rect.h),
            text: text.to_string(),
            color,
            size: font,
            weight: typography().body_large.weight,
        });
    }

    fn walk_scroll(
        &mut self,
        v: &View,
        node: NodeId,
        rect: Rect,
        pad: PaddingValues,
        hooks: &ScrollHooks,
        horizontal: bool,
    ) -> Result<(), UiError> {
        let mut hit = HitRegion::new(v.id, rect);
        hit.on_scroll = hooks.on_scroll.clone();
        hit.z_index = v.modifier.z_index;
        self.hits.push(hit);

        let mut content_extent = 0.0f32;
        for ch in self.taffy.children(node).map_err(layout_err)? {
            let cl = self.taffy.layout(ch).map_err(layout_err)?;
            let (cw, chh) = subtree_extents(ch, self.taffy)?;
            content_extent = content_extent.max(if horizontal {
                cl.location.x + cw
            } else {
                cl.location.y + chh
            });
        }
        content_extent += if horizontal { pad.right } else { pad.bottom };
        let viewport = if horizontal { rect.w } else { rect.h };

        if let Some(set) = &hooks.set_viewport {
            set(viewport);
        }
        if let Some(set) = &hooks.set_content {
            set(content_extent);
        }
        let offset = hooks.get_offset.as_ref().map(|g| g()).unwrap_or(0.0);

        let clip_radius = v
            .modifier
            .clip
            .map(|c| c.radius_for(rect, density().scale))
            .unwrap_or(0.0);
        self.scene.nodes.push(SceneNode::PushClip {
            rect,
            radius: clip_radius,
        });
        let origin = if horizontal {
            (rect.x - offset, rect.y)
        } else {
            (rect.x, rect.y - offset)
        };
        let hit_start = self.hits.len();
        for c in &v.children {
            self.walk(c, origin)?;
        }
        clip_hits(&mut self.hits, hit_start, rect);

        if !horizontal && content_extent > viewport + 0.5 {
            let th = theme();
            let thickness = dp_to_px(SCROLLBAR_THICKNESS);
            let margin = dp_to_px(SCROLLBAR_MARGIN);
            let track_h = (rect.h - 2.0 * margin).max(0.0);
            let thumb_h = (track_h * viewport / content_extent)
                .max(dp_to_px(SCROLLBAR_MIN_THUMB))
                .min(track_h);
            let t = (offset / (content_extent - viewport).max(1.0)).clamp(0.0, 1.0);
            self.scene.nodes.push(SceneNode::Rect {
                rect: Rect::new(
                    rect.right() - margin - thickness,
                    rect.y + margin + t * (track_h - thumb_h),
                    thickness,
                    thumb_h,
                ),
                color: th.scrollbar_thumb,
                radius: thickness * 0.5,
            });
        }

        self.scene.nodes.push(SceneNode::PopClip);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn run(root: View, size: (u32, u32)) -> (Scene, Vec<HitRegion>, Vec<SemNode>) {
        try_layout_and_paint(&root, size, &HashMap::new(), &Interactions::default(), None)
            .expect("layout")
    }

    fn texts(scene: &Scene) -> Vec<(String, Rect)> {
        scene
            .nodes
            .iter()
            .filter_map(|n| match n {
                SceneNode::Text { text, rect, .. } => Some((text.clone(), *rect)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn column_stacks_children_with_spacing() {
        let root = Column(Modifier::new().fill_max_size().spacing(8.0)).child((
            Box(Modifier::new().height(20.0).background(Color::WHITE)),
            Box(Modifier::new().height(30.0).background(Color::BLACK)),
        ));
        let (scene, _, _) = run(root, (100, 200));
        let rects: Vec<Rect> = scene
            .nodes
            .iter()
            .filter_map(|n| match n {
                SceneNode::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects, vec![Rect::new(0.0, 0.0, 100.0, 20.0), Rect::new(0.0, 28.0, 100.0, 30.0)]);
    }

    #[test]
    fn margin_offsets_and_padding_insets() {
        let root = Column(Modifier::new().fill_max_size()).child(
            Box(Modifier::new()
                .margin_horizontal(10.0)
                .padding(5.0)
                .height(40.0)
                .background(Color::WHITE))
            .child(Box(Modifier::new().fill_max_size().background(Color::BLACK))),
        );
        let (scene, _, _) = run(root, (100, 100));
        let rects: Vec<Rect> = scene
            .nodes
            .iter()
            .filter_map(|n| match n {
                SceneNode::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects[0], Rect::new(10.0, 0.0, 80.0, 40.0));
        assert_eq!(rects[1], Rect::new(15.0, 5.0, 70.0, 30.0));
    }

    #[test]
    fn baseline_padding_positions_text() {
        let style = typography().title_medium;
        let root = Column(Modifier::new().fill_max_size()).child(
            Text("Align your body")
                .style(style)
                .modifier(Modifier::new().padding_from_baseline(24.0, 12.0)),
        );
        let (scene, _, _) = run(root, (300, 300));
        let (_, r) = &texts(&scene)[0];
        let m = layoutlab_text::line_metrics(style.size, Some(style.line_height));
        assert!((r.y + m.baseline - 24.0).abs() < 0.01);
    }

    #[test]
    fn scroll_translates_content_and_clips_hits() {
        let state = Rc::new(crate::scroll::ScrollState::new());
        let list = Column(Modifier::new()).child(
            (0..10)
                .map(|i| Box(Modifier::new().height(50.0).clickable(move || { let _ = i; })))
                .collect::<Vec<_>>(),
        );
        let root = crate::scroll::ScrollArea(Modifier::new().fill_max_size(), state.clone(), list);

        let (_, hits, _) = run(root.clone(), (100, 120));
        assert_eq!(state.viewport(), 120.0);
        assert_eq!(state.content(), 500.0);
        // scroll container + 3 partially visible rows
        assert_eq!(hits.len(), 4);

        state.set_offset(100.0);
        let (_, hits, _) = run(root, (100, 120));
        let first = hits.iter().find(|h| h.on_click.is_some()).map(|h| h.rect);
        assert_eq!(first, Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
    }

    #[test]
    fn missing_image_paints_placeholder() {
        let root = Box(Modifier::new().fill_max_size()).child(Image(
            Modifier::new().size(88.0, 88.0).clip_circle(),
            ImageHandle::named("layout-test-missing"),
        ));
        let (scene, _, _) = run(root, (200, 200));
        assert!(!scene.nodes.iter().any(|n| matches!(n, SceneNode::Image { .. })));
        assert!(scene.nodes.iter().any(|n| matches!(
            n,
            SceneNode::Border { radius, .. } if (*radius - 44.0).abs() < 0.01
        )));
    }

    #[test]
    fn registered_image_is_cropped_to_square() {
        let handle = ImageHandle::named("layout-test-wide");
        let src = ImageSource::new("layout-test-wide", 4, 2, vec![255; 32]).expect("pixels");
        register_image(handle, src);
        let root = Box(Modifier::new().fill_max_size()).child(Image(
            Modifier::new().size(88.0, 88.0).clip_rounded(6.0),
            handle,
        ));
        let (scene, _, _) = run(root, (200, 200));
        let uv = scene.nodes.iter().find_map(|n| match n {
            SceneNode::Image { uv, radius, .. } => Some((*uv, *radius)),
            _ => None,
        });
        assert_eq!(uv, Some(([0.25, 0.0, 0.75, 1.0], 6.0)));
        unregister_image(handle);
    }

    #[test]
    fn text_field_shows_placeholder_until_typed() {
        let field = |value: &str| {
            Column(Modifier::new().fill_max_size()).child(TextField(
                value,
                |_| {},
                Modifier::new().fill_max_width(),
                TextFieldOptions::default().hint("Search"),
            ))
        };
        let (scene, hits, sems) = run(field(""), (300, 200));
        assert!(texts(&scene).iter().any(|(t, _)| t == "Search"));
        assert!(hits.iter().any(|h| h.focusable && h.tf_state_key.is_some()));
        assert!(sems.iter().any(|s| s.role == Role::TextField));

        let (scene, _, _) = run(field("yoga"), (300, 200));
        let shown: Vec<String> = texts(&scene).into_iter().map(|(t, _)| t).collect();
        assert_eq!(shown, vec!["yoga".to_string()]);
    }

    #[test]
    fn text_field_state_adopts_controlled_value() {
        let key = 77;
        let mut states = TextFieldStates::new();
        let st = Rc::new(RefCell::new(TextFieldState::new()));
        st.borrow_mut().insert_text("stale text");
        states.insert(key, st.clone());

        let root = Column(Modifier::new().fill_max_size()).child(TextField(
            "",
            |_| {},
            Modifier::new(),
            TextFieldOptions::default().hint("Search").state_key(key),
        ));
        let (scene, _, _) =
            try_layout_and_paint(&root, (300, 200), &states, &Interactions::default(), None)
                .expect("layout");
        assert_eq!(st.borrow().text, "");
        assert_eq!(st.borrow().selection, 0..0);
        assert!(texts(&scene).iter().any(|(t, _)| t == "Search"));
    }

    #[test]
    fn stack_overlays_and_absolute_pins_to_bottom() {
        let root = Stack(Modifier::new().fill_max_size()).child((
            Box(Modifier::new().fill_max_size().background(Color::WHITE)),
            Box(Modifier::new()
                .absolute()
                .offset(Some(0.0), None, Some(0.0), Some(0.0))
                .height(80.0)
                .background(Color::BLACK)),
        ));
        let (scene, _, _) = run(root, (100, 400));
        let rects: Vec<Rect> = scene
            .nodes
            .iter()
            .filter_map(|n| match n {
                SceneNode::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects, vec![Rect::new(0.0, 0.0, 100.0, 400.0), Rect::new(0.0, 320.0, 100.0, 80.0)]);
    }
}
