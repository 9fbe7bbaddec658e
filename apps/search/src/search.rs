//! The search screen: a search field over two titled sections, an avatar
//! row and a two-row grid of favorite cards.

use layoutlab_core::*;
use layoutlab_ui::*;

/// Items per list in the default content.
pub const ITEM_COUNT: usize = 10;
pub const ITEM_NAME: &str = "Lotfi Labib";
/// Resource name of the item image.
pub const ITEM_IMAGE: &str = "lotfi";

pub const ALIGN_YOUR_BODY: &str = "Align your body";
pub const FAVORITE_EXERCISES: &str = "Favorite exercises";

pub const SEARCH_HINT: &str = "Search";
const SEARCH_STATE_KEY: u64 = stable_key("search_bar");

const AVATAR_SIZE: f32 = 88.0;
const CARD_WIDTH: f32 = 225.0;
const CARD_MIN_HEIGHT: f32 = 80.0;
const GRID_HEIGHT: f32 = 168.0;
pub const GRID_ROWS: usize = 2;
const LIST_GAP: f32 = 8.0;
const LIST_PADDING: f32 = 16.0;

/// The name and picture rendered by every list entry.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayItem {
    pub name: String,
    pub image: ImageHandle,
}

impl DisplayItem {
    pub fn new(name: impl Into<String>, image: ImageHandle) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

/// Items shown by the two sections.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenContent {
    pub avatars: Vec<DisplayItem>,
    pub favorites: Vec<DisplayItem>,
}

impl ScreenContent {
    /// `count` copies of the placeholder item in each list.
    pub fn placeholder(count: usize) -> Self {
        let item = DisplayItem::new(ITEM_NAME, ImageHandle::named(ITEM_IMAGE));
        Self {
            avatars: vec![item.clone(); count],
            favorites: vec![item; count],
        }
    }
}

impl Default for ScreenContent {
    fn default() -> Self {
        Self::placeholder(ITEM_COUNT)
    }
}

pub fn SearchScreen(modifier: Modifier) -> View {
    SearchScreenWith(ScreenContent::default(), modifier)
}

/// Vertically scrolling page. `modifier` is applied to the scroll container,
/// which is how the shell passes its inner padding.
pub fn SearchScreenWith(content: ScreenContent, modifier: Modifier) -> View {
    let scroll = remember_scroll_state("search_screen.scroll");
    let avatars = content.avatars;
    let favorites = content.favorites;

    ScrollArea(
        Modifier::new().fill_max_size().then(modifier),
        scroll,
        Column(Modifier::new().fill_max_width()).child((
            SearchBar(Modifier::new().margin_horizontal(8.0)),
            HomeSection(ALIGN_YOUR_BODY, Modifier::new(), || {
                HorizontalList(&avatars, Modifier::new())
            }),
            HomeSection(FAVORITE_EXERCISES, Modifier::new(), || {
                FavoriteList(&favorites, Modifier::new())
            }),
            Gap(16.0),
        )),
    )
}

/// A heading followed by one instance of `content`.
pub fn HomeSection(title: &str, modifier: Modifier, content: impl FnOnce() -> View) -> View {
    Column(modifier).child((
        Text(title)
            .style(typography().title_medium)
            .modifier(
                Modifier::new()
                    .padding_from_baseline(24.0, 12.0)
                    .padding_horizontal(16.0),
            )
            .semantics(Semantics::new(Role::Heading).label(title)),
        content(),
    ))
}

/// Single-line search field. The query lives in a keyed slot, so it is
/// dropped when the field leaves the screen.
pub fn SearchBar(modifier: Modifier) -> View {
    let query = remember_state_with_key("search_bar.query", String::new);
    let value = query.borrow().clone();
    let on_change = {
        let query = query.clone();
        move |text: String| *query.borrow_mut() = text
    };
    let th = theme();

    TextField(
        value,
        on_change,
        modifier
            .fill_max_width()
            .min_height(56.0)
            .margin(12.0)
            .test_tag("search_bar"),
        TextFieldOptions::default()
            .hint(SEARCH_HINT)
            .leading(Icon(IconKind::Search, th.on_surface_variant))
            .state_key(SEARCH_STATE_KEY),
    )
}

pub fn HorizontalList(items: &[DisplayItem], modifier: Modifier) -> View {
    let state = remember_lazy_list_state("horizontal_list");
    let spec = LazyListSpec::new()
        .content_padding(PaddingValues::symmetric(LIST_PADDING, 0.0))
        .spacing(LIST_GAP)
        .item_extent(AVATAR_SIZE);

    LazyRow(
        items.len(),
        state,
        spec,
        modifier.test_tag("horizontal_list"),
        |i| HorizontalItem(&items[i], Modifier::new()),
    )
}

/// Circular picture with the name underneath.
pub fn HorizontalItem(item: &DisplayItem, modifier: Modifier) -> View {
    Column(modifier.align_items(AlignItems::Center)).child((
        Image(
            Modifier::new()
                .size(AVATAR_SIZE, AVATAR_SIZE)
                .clip_circle(),
            item.image,
        )
        .content_scale(ContentScale::Crop),
        Text(item.name.clone())
            .style(typography().body_medium)
            .modifier(Modifier::new().padding_from_baseline(24.0, 8.0)),
    ))
}

pub fn FavoriteList(items: &[DisplayItem], modifier: Modifier) -> View {
    let state = remember_lazy_list_state("favorite_grid");
    let spec = LazyListSpec::new()
        .content_padding(PaddingValues::symmetric(LIST_PADDING, 0.0))
        .spacing(LIST_GAP)
        .cross_spacing(LIST_GAP)
        .item_extent(CARD_WIDTH);

    LazyHorizontalGrid(
        GRID_ROWS,
        items.len(),
        state,
        spec,
        modifier.height(GRID_HEIGHT).test_tag("favorite_grid"),
        |i| FavoriteItem(&items[i], Modifier::new().min_height(CARD_MIN_HEIGHT)),
    )
}

/// Tinted card: picture on the left, name beside it, vertically centered.
pub fn FavoriteItem(item: &DisplayItem, modifier: Modifier) -> View {
    let th = theme();
    Surface(
        modifier
            .width(CARD_WIDTH)
            .fill_max_height()
            .background(th.surface_variant)
            .clip_rounded(shapes().medium),
        Row(Modifier::new()
            .fill_max_size()
            .padding(8.0)
            .align_items(AlignItems::Center))
        .child((
            Image(
                Modifier::new()
                    .width(AVATAR_SIZE)
                    .fill_max_height()
                    .clip_rounded(6.0),
                item.image,
            )
            .content_scale(ContentScale::Crop),
            Text(item.name.clone())
                .style(typography().title_medium)
                .color(th.on_surface_variant)
                .modifier(Modifier::new().padding_start(12.0)),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_texts(v: &View, needle: &str) -> usize {
        let mut n = 0;
        v.visit(&mut |c| {
            if c.text() == Some(needle) {
                n += 1;
            }
        });
        n
    }

    #[test]
    fn section_renders_title_once_above_content() {
        let v = HomeSection("Title", Modifier::new(), || Text("body"));
        assert_eq!(v.children.len(), 2);
        assert_eq!(v.children[0].text(), Some("Title"));
        assert_eq!(v.children[1].text(), Some("body"));
        assert_eq!(count_texts(&v, "Title"), 1);
    }

    #[test]
    fn default_content_is_ten_placeholders() {
        let content = ScreenContent::default();
        assert_eq!(content.avatars.len(), ITEM_COUNT);
        assert_eq!(content.favorites.len(), ITEM_COUNT);
        assert!(content.favorites.iter().all(|i| i.name == ITEM_NAME));
        assert_eq!(content.avatars[0].image, ImageHandle::named(ITEM_IMAGE));
    }

    #[test]
    fn avatar_is_circular_picture_over_label() {
        let item = DisplayItem::new("Ada", ImageHandle::named("ada"));
        let v = HorizontalItem(&item, Modifier::new());
        assert!(matches!(v.children[0].kind, ViewKind::Image { .. }));
        assert_eq!(v.children[0].modifier.clip, Some(Shape::Circle));
        assert_eq!(v.children[1].text(), Some("Ada"));
    }

    #[test]
    fn favorite_card_is_tinted_and_rounded() {
        let item = DisplayItem::new("Ada", ImageHandle::named("ada"));
        let card = FavoriteItem(&item, Modifier::new());
        assert!(matches!(card.kind, ViewKind::Surface));
        assert_eq!(card.modifier.background, Some(theme().surface_variant));
        let row = &card.children[0];
        assert!(matches!(row.kind, ViewKind::Row));
        assert_eq!(row.children[0].modifier.clip, Some(Shape::Rounded(6.0)));
        assert_eq!(row.children[1].text(), Some("Ada"));
    }
}
