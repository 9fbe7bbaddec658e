//! Text and JSON dumps of a `View` tree.

use std::fmt::Write as _;

use layoutlab_core::{Semantics, View, ViewKind};
use serde::Serialize;

fn describe_semantics(s: &Semantics) -> String {
    let mut out = format!("{:?}", s.role);
    if let Some(label) = &s.label {
        let _ = write!(out, " label={label:?}");
    }
    if s.selected {
        out.push_str(" selected");
    }
    if let Some(c) = s.collection {
        let _ = write!(out, " {}x{} items={}", c.rows, c.columns, c.item_count);
    }
    out
}

fn describe(v: &View) -> String {
    let mut line = v.kind.name().to_string();
    match &v.kind {
        ViewKind::Text { text, .. } => {
            let _ = write!(line, " {text:?}");
        }
        ViewKind::TextField { value, hint, .. } => {
            let _ = write!(line, " value={value:?} hint={hint:?}");
        }
        _ => {}
    }
    if let Some(tag) = &v.modifier.test_tag {
        let _ = write!(line, " #{tag}");
    }
    if let Some(s) = &v.semantics {
        let _ = write!(line, " [{}]", describe_semantics(s));
    }
    line
}

/// One line per view, indented two spaces per level.
pub fn tree_dump(root: &View) -> String {
    fn go(v: &View, depth: usize, out: &mut Vec<String>) {
        out.push(format!("{}{}", "  ".repeat(depth), describe(v)));
        for c in &v.children {
            go(c, depth + 1, out);
        }
    }
    let mut lines = vec![];
    go(root, 0, &mut lines);
    lines.join("\n")
}

/// Text of every `Text` view, pre-order.
pub fn texts(root: &View) -> Vec<String> {
    let mut out = vec![];
    root.visit(&mut |v| {
        if let Some(t) = v.text() {
            out.push(t.to_string());
        }
    });
    out
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TreeNode {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantics: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl From<&View> for TreeNode {
    fn from(v: &View) -> Self {
        let text = match &v.kind {
            ViewKind::Text { text, .. } => Some(text.clone()),
            ViewKind::TextField { value, .. } => Some(value.clone()),
            _ => None,
        };
        TreeNode {
            kind: v.kind.name(),
            text,
            tag: v.modifier.test_tag.clone(),
            semantics: v.semantics.as_ref().map(describe_semantics),
            children: v.children.iter().map(TreeNode::from).collect(),
        }
    }
}

pub fn to_json(root: &View) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&TreeNode::from(root))
}
