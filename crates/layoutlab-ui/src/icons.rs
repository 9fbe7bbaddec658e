//! Vector-free icons drawn from rounded rects and rings.

use layoutlab_core::*;

use crate::Box;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconKind {
    Search,
    Home,
    Person,
}

/// A 24dp icon tinted with `tint`.
pub fn Icon(kind: IconKind, tint: Color) -> View {
    Box(Modifier::new()
        .size(24.0, 24.0)
        .painter(move |scene, rect| paint_icon(scene, rect, kind, tint)))
    .semantics(Semantics::new(Role::Image).label(format!("{kind:?}")))
}

fn at(r: Rect, x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::new(r.x + r.w * x, r.y + r.h * y, r.w * w, r.h * h)
}

pub fn paint_icon(scene: &mut Scene, r: Rect, kind: IconKind, color: Color) {
    let s = r.w.min(r.h);
    match kind {
        IconKind::Search => {
            scene.nodes.push(SceneNode::Border {
                rect: at(r, 0.125, 0.125, 0.5, 0.5),
                color,
                width: s * 0.09,
                radius: s * 0.25,
            });
            // Handle: overlapping dots along the diagonal.
            for i in 0..5 {
                let t = 0.58 + i as f32 * 0.055;
                scene.nodes.push(SceneNode::Rect {
                    rect: at(r, t, t, 0.13, 0.13),
                    color,
                    radius: s * 0.05,
                });
            }
        }
        IconKind::Home => {
            // Roof as three stacked steps.
            for (i, (x, w)) in [(0.42, 0.16), (0.29, 0.42), (0.16, 0.68)].iter().enumerate() {
                scene.nodes.push(SceneNode::Rect {
                    rect: at(r, *x, 0.14 + i as f32 * 0.1, *w, 0.11),
                    color,
                    radius: s * 0.02,
                });
            }
            scene.nodes.push(SceneNode::Rect {
                rect: at(r, 0.22, 0.44, 0.56, 0.42),
                color,
                radius: s * 0.03,
            });
        }
        IconKind::Person => {
            scene.nodes.push(SceneNode::Rect {
                rect: at(r, 0.33, 0.12, 0.34, 0.34),
                color,
                radius: s * 0.17,
            });
            scene.nodes.push(SceneNode::Rect {
                rect: at(r, 0.17, 0.55, 0.66, 0.33),
                color,
                radius: s * 0.16,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_stay_inside_their_box() {
        let r = Rect::new(10.0, 20.0, 24.0, 24.0);
        for kind in [IconKind::Search, IconKind::Home, IconKind::Person] {
            let mut scene = Scene::default();
            paint_icon(&mut scene, r, kind, Color::WHITE);
            assert!(!scene.nodes.is_empty());
            for n in &scene.nodes {
                let rect = match n {
                    SceneNode::Rect { rect, .. } | SceneNode::Border { rect, .. } => *rect,
                    other => panic!("unexpected node {other:?}"),
                };
                assert!(rect.x >= r.x - 0.01 && rect.right() <= r.right() + 0.01);
                assert!(rect.y >= r.y - 0.01 && rect.bottom() <= r.bottom() + 0.01);
            }
        }
    }
}
