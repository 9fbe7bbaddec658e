//! App frame: the search screen inside a scaffold with a bottom bar.

use layoutlab_core::*;
use layoutlab_ui::material3::{NavItem, NavigationBar, Scaffold};
use layoutlab_ui::*;

use crate::search::SearchScreen;

const TABS: [(&str, IconKind); 2] = [("Home", IconKind::Home), ("Profile", IconKind::Person)];

/// Bottom bar with a remembered selection. Selecting a tab only moves the
/// indicator; there is nothing to route to.
pub fn BottomNavigation() -> View {
    let selected = remember_state_with_key("bottom_navigation.selected", || 0usize);
    let current = *selected.borrow();
    let th = theme();

    let items = TABS
        .iter()
        .enumerate()
        .map(|(i, (label, icon))| {
            let selected = selected.clone();
            let tint = if i == current {
                th.on_secondary_container
            } else {
                th.on_surface_variant
            };
            NavItem::new(*label, Icon(*icon, tint), move || {
                log::debug!("bottom navigation: tab {i}");
                *selected.borrow_mut() = i;
            })
        })
        .collect();
    NavigationBar(current, items)
}

pub fn MainApp() -> View {
    Scaffold(
        Modifier::new().fill_max_size(),
        Some(BottomNavigation()),
        |inner| SearchScreen(Modifier::new().padding_values(inner)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_bar_has_two_static_tabs() {
        let _guard = ComposeGuard::begin(Composer::default());
        let bar = BottomNavigation();
        let labels: Vec<_> = bar
            .children
            .iter()
            .filter_map(|c| c.semantics.as_ref()?.label.clone())
            .collect();
        assert_eq!(labels, ["Home", "Profile"]);
        assert!(bar.children[0].semantics.as_ref().is_some_and(|s| s.selected));
    }
}
