//! Material-style app chrome: `Scaffold` and `NavigationBar`.

use std::rc::Rc;

use layoutlab_core::*;

use crate::{Box, Column, Row, Stack, Text, TextStyle, ViewExt};

/// Height of the navigation bar above the bottom inset (dp).
pub const NAVIGATION_BAR_HEIGHT: f32 = 80.0;

pub struct NavItem {
    pub icon: View,
    pub label: String,
    pub on_click: Rc<dyn Fn()>,
}

impl NavItem {
    pub fn new(label: impl Into<String>, icon: View, on_click: impl Fn() + 'static) -> Self {
        Self {
            icon,
            label: label.into(),
            on_click: Rc::new(on_click),
        }
    }
}

/// Bottom navigation with one equally wide slot per item. The bar extends
/// under the bottom window inset.
pub fn NavigationBar(selected_index: usize, items: Vec<NavItem>) -> View {
    let th = theme();
    let insets = window_insets();
    Row(Modifier::new()
        .fill_max_width()
        .height(NAVIGATION_BAR_HEIGHT + insets.bottom)
        .background(th.surface_variant)
        .padding_values(PaddingValues {
            left: insets.left,
            right: insets.right,
            top: 12.0,
            bottom: 16.0 + insets.bottom,
        })
        .spacing(8.0)
        .test_tag("navigation_bar"))
    .child(
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| NavigationBarItem(item, i == selected_index))
            .collect::<Vec<_>>(),
    )
}

fn NavigationBarItem(item: NavItem, selected: bool) -> View {
    let th = theme();
    let label_color = if selected {
        th.on_surface
    } else {
        th.on_surface_variant
    };
    let indicator = if selected {
        Some(th.secondary_container)
    } else {
        None
    };

    let on_click = item.on_click.clone();
    let pill = Box(indicator
        .map(|c| Modifier::new().background(c))
        .unwrap_or_default()
        .size(64.0, 32.0)
        .clip_rounded(16.0)
        .align_items(AlignItems::Center)
        .justify_content(JustifyContent::Center))
    .child(item.icon);

    Column(
        Modifier::new()
            .weight(1.0)
            .align_items(AlignItems::Center)
            .spacing(4.0)
            .clickable(move || on_click()),
    )
    .semantics(
        Semantics::new(Role::Tab)
            .label(item.label.clone())
            .selected(selected),
    )
    .child((
        pill,
        Text(item.label)
            .style(typography().label_medium)
            .color(label_color),
    ))
}

/// Screen frame with an optional bottom bar. `content` receives the padding
/// that keeps it clear of the bar and the window insets.
pub fn Scaffold(
    modifier: Modifier,
    bottom_bar: Option<View>,
    content: impl FnOnce(PaddingValues) -> View,
) -> View {
    let insets = window_insets();
    let inner = PaddingValues {
        left: insets.left,
        right: insets.right,
        top: insets.top,
        bottom: if bottom_bar.is_some() {
            NAVIGATION_BAR_HEIGHT + insets.bottom
        } else {
            insets.bottom
        },
    };

    let bottom = bottom_bar.map(|bar| {
        Box(Modifier::new()
            .absolute()
            .offset(Some(0.0), None, Some(0.0), Some(0.0))
            .z_index(1.0))
        .child(bar)
    });

    Stack(
        Modifier::new()
            .fill_max_size()
            .background(theme().background)
            .then(modifier),
    )
    .child((
        Box(Modifier::new().fill_max_size()).child(content(inner)),
        bottom,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn scaffold_reserves_bar_and_insets() {
        let seen = Cell::new(PaddingValues::ZERO);
        let insets = WindowInsets {
            left: 0.0,
            top: 24.0,
            right: 0.0,
            bottom: 16.0,
        };
        with_window_insets(insets, || {
            Scaffold(Modifier::new(), Some(Box(Modifier::new())), |p| {
                seen.set(p);
                Box(Modifier::new())
            })
        });
        let p = seen.get();
        assert_eq!(p.top, 24.0);
        assert_eq!(p.bottom, NAVIGATION_BAR_HEIGHT + 16.0);
    }

    #[test]
    fn navigation_bar_marks_selected_tab() {
        let clicked = Rc::new(Cell::new(None));
        let items = ["Home", "Profile"]
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let clicked = clicked.clone();
                NavItem::new(*l, Box(Modifier::new()), move || clicked.set(Some(i)))
            })
            .collect();
        let bar = NavigationBar(1, items);
        let tabs: Vec<_> = bar
            .children
            .iter()
            .filter_map(|c| c.semantics.clone())
            .collect();
        assert_eq!(tabs.len(), 2);
        assert!(!tabs[0].selected);
        assert!(tabs[1].selected);

        if let Some(click) = &bar.children[0].modifier.on_click {
            click();
        }
        assert_eq!(clicked.get(), Some(0));
    }
}
