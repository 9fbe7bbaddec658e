use layoutlab_core::input::PointerKind;
use layoutlab_core::*;
use layoutlab_devtools::{texts, tree_dump};
use layoutlab_platform::{EditCommand, FocusChange, UiSession};
use layoutlab_search::search::{
    ALIGN_YOUR_BODY, FAVORITE_EXERCISES, GRID_ROWS, ITEM_NAME, SEARCH_HINT,
};
use layoutlab_search::*;
use layoutlab_ui::IconKind;
use layoutlab_ui::material3::NAVIGATION_BAR_HEIGHT;

fn session() -> UiSession {
    let mut s = UiSession::new();
    s.set_surface((412, 892), 1.0);
    s
}

fn screen(content: ScreenContent) -> impl FnMut(&mut Scheduler) -> View {
    move |_s| SearchTheme(|| SearchScreenWith(content.clone(), Modifier::new()))
}

fn root(s: &UiSession) -> &View {
    &s.frame().expect("composed").root
}

fn search_value(s: &UiSession) -> String {
    let mut value = None;
    root(s).visit(&mut |node| {
        if let ViewKind::TextField { value: text, .. } = &node.kind {
            value = Some(text.clone());
        }
    });
    value.expect("search field")
}

fn scene_texts(scene: &Scene) -> Vec<String> {
    scene
        .nodes
        .iter()
        .filter_map(|n| match n {
            SceneNode::Text { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn focus_search_field(s: &mut UiSession) {
    let center = {
        let hit = s
            .frame()
            .expect("composed")
            .hit_regions
            .iter()
            .find(|h| h.tf_state_key.is_some())
            .expect("text field hit region");
        Vec2::new(hit.rect.x + hit.rect.w * 0.5, hit.rect.y + hit.rect.h * 0.5)
    };
    let change = s.pointer_pressed(center, PointerKind::Mouse, Modifiers::empty());
    assert!(matches!(change, FocusChange::TextField(_)));
    s.pointer_released(center, PointerKind::Mouse);
}

#[test]
fn screen_shows_search_field_and_both_sections() {
    let mut s = session();
    let mut app = screen(ScreenContent::default());
    let scene = s.compose(&mut app);

    let labels = texts(root(&s));
    assert_eq!(labels.iter().filter(|t| *t == ALIGN_YOUR_BODY).count(), 1);
    assert_eq!(labels.iter().filter(|t| *t == FAVORITE_EXERCISES).count(), 1);
    // Nothing is measured on the first pass, so every item is composed.
    assert_eq!(labels.iter().filter(|t| *t == ITEM_NAME).count(), 20);

    assert_eq!(search_value(&s), "");
    assert!(scene_texts(&scene).iter().any(|t| t == SEARCH_HINT));

    let order: Vec<&str> = labels
        .iter()
        .map(String::as_str)
        .filter(|t| *t == ALIGN_YOUR_BODY || *t == FAVORITE_EXERCISES)
        .collect();
    assert_eq!(order, [ALIGN_YOUR_BODY, FAVORITE_EXERCISES]);
}

#[test]
fn lists_report_item_count_after_scrolling() {
    let mut s = session();
    let mut app = screen(ScreenContent::default());
    s.compose(&mut app);

    let list_rect = s
        .frame()
        .and_then(|f| {
            f.hit_regions
                .iter()
                .find(|h| h.on_scroll.is_some() && h.rect.h < 300.0)
                .map(|h| h.rect)
        })
        .expect("horizontal list");
    let inside = Vec2::new(list_rect.x + 20.0, list_rect.y + 20.0);
    assert!(s.scroll(inside, Vec2::new(400.0, 0.0)));
    s.compose(&mut app);
    s.compose(&mut app);

    let list = root(&s).find_by_tag("horizontal_list").expect("list");
    let info = list.semantics.as_ref().and_then(|s| s.collection);
    assert_eq!(info.map(|c| c.item_count), Some(10));
    assert_eq!(info.map(|c| c.rows), Some(1));

    let grid = root(&s).find_by_tag("favorite_grid").expect("grid");
    let info = grid.semantics.as_ref().and_then(|s| s.collection);
    assert_eq!(info.map(|c| (c.rows, c.columns, c.item_count)), Some((2, 5, 10)));
}

#[test]
fn grid_keeps_two_rows_for_any_count() {
    for n in [1, 3, 10, 11] {
        let mut s = session();
        let mut app = screen(ScreenContent::placeholder(n));
        s.compose(&mut app);

        let grid = root(&s).find_by_tag("favorite_grid").expect("grid");
        let info = grid.semantics.as_ref().and_then(|s| s.collection).expect("info");
        assert_eq!(info.rows, GRID_ROWS);
        assert_eq!(info.columns, n.div_ceil(GRID_ROWS));
        assert_eq!(info.item_count, n);

        // ScrollH > content row > one column per grid column, plus spacers
        // for skipped columns once the viewport is known.
        let columns: Vec<&View> = grid.children[0]
            .children
            .iter()
            .filter(|c| matches!(c.kind, ViewKind::Column))
            .collect();
        assert_eq!(columns.len(), n.div_ceil(GRID_ROWS));
        assert!(columns.iter().all(|c| c.children.len() == GRID_ROWS));
        assert_eq!(texts(grid).len(), n);
    }
}

#[test]
fn new_session_starts_with_empty_field_and_full_grid() {
    {
        let mut s = session();
        let mut app = screen(ScreenContent::default());
        s.compose(&mut app);
        focus_search_field(&mut s);
        s.edit(EditCommand::Insert("yoga".into()));
        s.compose(&mut app);
        s.compose(&mut app);
        assert_eq!(search_value(&s), "yoga");
    }

    let mut s = session();
    let mut app = screen(ScreenContent::default());
    s.compose(&mut app);
    assert_eq!(search_value(&s), "");
    let grid = root(&s).find_by_tag("favorite_grid").expect("grid");
    assert_eq!(texts(grid).len(), 10);
    assert!(grid.children[0].children.iter().all(|c| matches!(c.kind, ViewKind::Column)));
}

#[test]
fn search_icon_leads_the_input() {
    let mut s = session();
    let mut app = screen(ScreenContent::default());
    s.compose(&mut app);

    let bar = root(&s).find_by_tag("search_bar").expect("search bar");
    let icon = bar.children[0].children.first().expect("leading icon");
    let label = icon.semantics.as_ref().and_then(|s| s.label.clone());
    assert_eq!(label, Some(format!("{:?}", IconKind::Search)));
    assert!(matches!(bar.children[1].kind, ViewKind::TextField { .. }));

    let sems = &s.frame().expect("composed").semantics_nodes;
    let icon = sems.iter().find(|n| n.role == Role::Image).expect("icon node");
    let field = sems.iter().find(|n| n.role == Role::TextField).expect("field node");
    assert!(icon.rect.x + icon.rect.w <= field.rect.x);
}

#[test]
fn typing_shows_exactly_what_was_typed() {
    let mut s = session();
    let mut app = screen(ScreenContent::default());
    s.compose(&mut app);
    focus_search_field(&mut s);

    for ch in "yoga\t2x é👍🏽".chars() {
        assert!(s.edit(EditCommand::Insert(ch.to_string())));
        s.compose(&mut app);
    }
    assert_eq!(search_value(&s), "yoga 2x é👍🏽");

    assert!(s.edit(EditCommand::Backspace));
    s.compose(&mut app);
    assert_eq!(search_value(&s), "yoga 2x é");
}

#[test]
fn clearing_the_field_brings_back_the_placeholder() {
    let mut s = session();
    let mut app = screen(ScreenContent::default());
    s.compose(&mut app);
    focus_search_field(&mut s);

    s.edit(EditCommand::Insert("stretch".into()));
    let scene = s.compose(&mut app);
    assert!(scene_texts(&scene).iter().any(|t| t == "stretch"));
    assert!(!scene_texts(&scene).iter().any(|t| t == SEARCH_HINT));

    s.edit(EditCommand::SelectAll);
    s.edit(EditCommand::Backspace);
    let scene = s.compose(&mut app);
    assert_eq!(search_value(&s), "");
    assert!(scene_texts(&scene).iter().any(|t| t == SEARCH_HINT));
}

#[test]
fn missing_image_falls_back_to_placeholder() {
    let missing = ImageHandle::named("search-test-missing");
    let item = DisplayItem::new(ITEM_NAME, missing);
    let content = ScreenContent {
        avatars: vec![item.clone(); 2],
        favorites: vec![item; 2],
    };
    let mut s = session();
    let scene = s.compose(&mut screen(content));

    assert!(!scene.nodes.iter().any(
        |n| matches!(n, SceneNode::Image { handle, .. } if *handle == missing)
    ));
    // Circle-clipped placeholder frame for each avatar.
    let circles = scene
        .nodes
        .iter()
        .filter(|n| matches!(n, SceneNode::Border { radius, .. } if (*radius - 44.0).abs() < 0.01))
        .count();
    assert_eq!(circles, 2);
}

#[test]
fn bundled_image_registers() {
    load_assets();
    assert!(is_registered(ImageHandle::named(search::ITEM_IMAGE)));
    let img = image(ImageHandle::named(search::ITEM_IMAGE)).expect("image");
    assert!(img.width > 0 && img.height > 0);
}

#[test]
fn shell_reserves_room_for_the_bottom_bar() {
    let mut s = session();
    s.set_insets(WindowInsets {
        top: 24.0,
        bottom: 16.0,
        ..WindowInsets::default()
    });
    s.compose(&mut app);

    let mut padding = None;
    root(&s).visit(&mut |node| {
        if matches!(node.kind, ViewKind::ScrollV(_)) {
            padding = node.modifier.padding;
        }
    });
    let padding = padding.expect("screen padding");
    assert_eq!(padding.top, 24.0);
    assert_eq!(padding.bottom, NAVIGATION_BAR_HEIGHT + 16.0);

    let bar = root(&s).find_by_tag("navigation_bar").expect("bar");
    let tabs: Vec<_> = bar
        .children
        .iter()
        .filter_map(|c| c.semantics.as_ref()?.label.clone())
        .collect();
    assert_eq!(tabs, ["Home", "Profile"]);

    // Clicking "Profile" only moves the selection.
    let profile = s
        .frame()
        .and_then(|f| {
            f.semantics_nodes
                .iter()
                .find(|n| n.label.as_deref() == Some("Profile"))
                .map(|n| n.rect)
        })
        .expect("profile tab");
    let at = Vec2::new(profile.x + profile.w * 0.5, profile.y + profile.h * 0.5);
    s.pointer_pressed(at, PointerKind::Mouse, Modifiers::empty());
    assert!(s.pointer_released(at, PointerKind::Mouse));
    s.compose(&mut app);

    let bar = root(&s).find_by_tag("navigation_bar").expect("bar");
    let selected: Vec<bool> = bar
        .children
        .iter()
        .filter_map(|c| c.semantics.as_ref().map(|s| s.selected))
        .collect();
    assert_eq!(selected, [false, true]);
    assert!(texts(root(&s)).iter().any(|t| t == ALIGN_YOUR_BODY));
}

#[test]
fn section_tree_dump() {
    let v = HomeSection(ALIGN_YOUR_BODY, Modifier::new(), || {
        HorizontalItem(
            &DisplayItem::new(ITEM_NAME, ImageHandle::named("lotfi")),
            Modifier::new(),
        )
    });
    insta::assert_snapshot!(tree_dump(&v), @r#"
    Column
      Text "Align your body" [Heading label="Align your body"]
      Column
        Image
        Text "Lotfi Labib"
    "#);
}
