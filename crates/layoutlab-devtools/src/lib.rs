//! Developer tools: a frame HUD, a hover inspector overlay and view-tree
//! dumps (plain text and JSON) used for debugging and in tests.

pub mod tree;

pub use tree::{TreeNode, texts, to_json, tree_dump};

use web_time::Instant;

use layoutlab_core::{Color, FontWeight, Rect, Scene, SceneNode};

pub struct Hud {
    pub inspector_enabled: bool,
    pub hovered: Option<Rect>,
    frame_count: u64,
    last_frame: Option<Instant>,
    fps_smooth: f32,
    pub metrics: Option<Metrics>,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            inspector_enabled: false,
            hovered: None,
            frame_count: 0,
            last_frame: None,
            fps_smooth: 0.0,
            metrics: None,
        }
    }

    pub fn toggle_inspector(&mut self) {
        self.inspector_enabled = !self.inspector_enabled;
        log::info!(
            "inspector {}",
            if self.inspector_enabled { "on" } else { "off" }
        );
    }

    pub fn set_hovered(&mut self, r: Option<Rect>) {
        self.hovered = r;
    }

    pub fn fps(&self) -> f32 {
        self.fps_smooth
    }

    /// Status line shown at the top left of the overlay.
    pub fn status_line(&self) -> String {
        let mut parts = vec![
            format!("frame: {}", self.frame_count),
            format!("fps: {:.1}", self.fps_smooth),
        ];
        if let Some(m) = &self.metrics {
            parts.push(format!("build+layout: {:.2} ms", m.build_layout_ms));
            parts.push(format!("nodes: {}", m.scene_nodes));
            parts.push(format!("hits: {}", m.hit_regions));
        }
        parts.join("  |  ")
    }

    pub fn overlay(&mut self, scene: &mut Scene) {
        self.frame_count += 1;
        let now = Instant::now();
        if let Some(prev) = self.last_frame.replace(now) {
            let dt = (now - prev).as_secs_f32();
            if dt > 0.0 {
                let fps = 1.0 / dt;
                // EMA
                let a = 0.2;
                self.fps_smooth = if self.fps_smooth == 0.0 {
                    fps
                } else {
                    (1.0 - a) * self.fps_smooth + a * fps
                };
            }
        }

        scene.nodes.push(SceneNode::Rect {
            rect: Rect::new(4.0, 4.0, 360.0, 22.0),
            color: Color::from_hex("#000000AA"),
            radius: 4.0,
        });
        scene.nodes.push(SceneNode::Text {
            rect: Rect::new(8.0, 6.0, 352.0, 18.0),
            text: self.status_line(),
            color: Color::from_hex("#DDDDDD"),
            size: 13.0,
            weight: FontWeight::NORMAL,
        });

        if let Some(r) = self.hovered {
            scene.nodes.push(SceneNode::Rect {
                rect: r,
                color: Color::from_hex("#44AAFF22"),
                radius: 0.0,
            });
            scene.nodes.push(SceneNode::Border {
                rect: r,
                color: Color::from_hex("#44AAFF"),
                width: 2.0,
                radius: 0.0,
            });
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Metrics {
    pub build_layout_ms: f32,
    pub scene_nodes: usize,
    pub hit_regions: usize,
}

pub struct Inspector {
    pub hud: Hud,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self { hud: Hud::new() }
    }

    pub fn frame(&mut self, scene: &mut Scene) {
        if self.hud.inspector_enabled {
            self.hud.overlay(scene);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_only_when_enabled() {
        let mut ins = Inspector::new();
        let mut scene = Scene::default();
        ins.frame(&mut scene);
        assert!(scene.nodes.is_empty());

        ins.hud.toggle_inspector();
        ins.hud.set_hovered(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        ins.hud.metrics = Some(Metrics {
            build_layout_ms: 1.5,
            scene_nodes: 42,
            hit_regions: 3,
        });
        ins.frame(&mut scene);
        assert!(scene.nodes.iter().any(|n| matches!(n, SceneNode::Border { .. })));
        assert!(ins.hud.status_line().contains("nodes: 42"));
    }
}
