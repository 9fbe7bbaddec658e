use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::{CollectionInfo, Rect, Scene, Vec2, View, semantics::Role};

thread_local! {
    /// Slots of the pass currently running on this thread. Between passes
    /// they live on the owning [`Scheduler`].
    static COMPOSER: RefCell<Composer> = RefCell::new(Composer::default());
    static FRAME_REQUESTED: Cell<bool> = const { Cell::new(false) };
}

/// Keyed slot storage for `remember*`.
#[derive(Default)]
pub struct Composer {
    pub keyed_slots: HashMap<String, Box<dyn Any>>,
    /// Keys read during the current pass; `None` outside a pass.
    touched: Option<HashSet<String>>,
}

impl Composer {
    fn begin_pass(&mut self) {
        self.touched = Some(HashSet::new());
    }

    /// Drops keyed slots nobody read.
    fn end_pass(&mut self) {
        if let Some(touched) = self.touched.take() {
            let before = self.keyed_slots.len();
            self.keyed_slots.retain(|k, _| touched.contains(k));
            let dropped = before - self.keyed_slots.len();
            if dropped > 0 {
                log::trace!("composer: dropped {dropped} keyed slot(s)");
            }
        }
    }
}

/// One composition pass over `composer`'s slots. [`ComposeGuard::finish`]
/// hands the slots back; dropping the guard unfinished discards them.
pub struct ComposeGuard {
    finished: bool,
}

impl ComposeGuard {
    pub fn begin(mut composer: Composer) -> Self {
        composer.begin_pass();
        COMPOSER.with(|c| *c.borrow_mut() = composer);
        ComposeGuard { finished: false }
    }

    pub fn finish(mut self) -> Composer {
        self.finished = true;
        Self::end()
    }

    fn end() -> Composer {
        COMPOSER.with(|c| {
            let mut c = c.borrow_mut();
            c.end_pass();
            std::mem::take(&mut *c)
        })
    }
}

impl Drop for ComposeGuard {
    fn drop(&mut self) {
        if !self.finished {
            drop(Self::end());
        }
    }
}

/// Key-based remember. The slot survives only while some pass reads it.
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    COMPOSER.with(|c| {
        let mut c = c.borrow_mut();
        let key = key.into();
        if let Some(touched) = c.touched.as_mut() {
            touched.insert(key.clone());
        }

        if let Some(existing) = c.keyed_slots.get(&key) {
            if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
                return rc.clone();
            }
            log::warn!(
                "remember_with_key: key '{}' reused with a different type; replacing.",
                key
            );
        }

        let rc: Rc<T> = Rc::new(init());
        c.keyed_slots.insert(key, Box::new(rc.clone()));
        rc
    })
}

pub fn remember_state_with_key<T: 'static>(
    key: impl Into<String>,
    init: impl FnOnce() -> T,
) -> Rc<RefCell<T>> {
    remember_with_key(key, || RefCell::new(init()))
}

/// Asks the runner for another frame, e.g. while a fling is still moving.
pub fn request_frame() {
    FRAME_REQUESTED.with(|f| f.set(true));
}

/// Returns and clears the pending frame request.
pub fn take_frame_request() -> bool {
    FRAME_REQUESTED.with(|f| f.replace(false))
}

/// Output of one composition pass: scene, hit regions, semantics and focus chain.
pub struct Frame {
    pub root: View,
    pub scene: Scene,
    pub hit_regions: Vec<HitRegion>,
    pub semantics_nodes: Vec<SemNode>,
    pub focus_chain: Vec<u64>,
}

#[derive(Clone)]
pub struct HitRegion {
    pub id: u64,
    pub rect: Rect,
    pub on_click: Option<Rc<dyn Fn()>>,
    pub on_scroll: Option<Rc<dyn Fn(Vec2) -> Vec2>>,
    pub focusable: bool,
    pub z_index: f32,
    pub on_text_change: Option<Rc<dyn Fn(String)>>,
    /// Set for text fields: key of the platform-held `TextFieldState`.
    pub tf_state_key: Option<u64>,
    /// Text fields only: the controlled value at paint time, used to seed
    /// editing state on first focus.
    pub tf_value: Option<String>,
}

impl HitRegion {
    pub fn new(id: u64, rect: Rect) -> Self {
        Self {
            id,
            rect,
            on_click: None,
            on_scroll: None,
            focusable: false,
            z_index: 0.0,
            on_text_change: None,
            tf_state_key: None,
            tf_value: None,
        }
    }
}

/// Flattened semantics node produced by `layout_and_paint`.
#[derive(Clone, Debug, PartialEq)]
pub struct SemNode {
    /// Shared with the associated `HitRegion` / `ViewId`.
    pub id: u64,
    pub role: Role,
    pub label: Option<String>,
    pub rect: Rect,
    pub focused: bool,
    pub enabled: bool,
    pub selected: bool,
    pub collection: Option<CollectionInfo>,
}

pub struct Scheduler {
    next_id: u64,
    composer: Composer,
    pub focused: Option<u64>,
    /// Surface size in physical pixels.
    pub size: (u32, u32),
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            composer: Composer::default(),
            focused: None,
            size: (412, 892),
        }
    }

    pub fn id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Runs one composition pass and lays out the result.
    pub fn compose<F>(
        &mut self,
        mut build_root: F,
        layout_paint: impl FnOnce(&View, (u32, u32)) -> (Scene, Vec<HitRegion>, Vec<SemNode>),
    ) -> Frame
    where
        F: FnMut(&mut Scheduler) -> View,
    {
        let guard = ComposeGuard::begin(std::mem::take(&mut self.composer));
        let root = build_root(self);
        self.composer = guard.finish();
        let (scene, hits, sem) = layout_paint(&root, self.size);

        let focus_chain: Vec<u64> = hits.iter().filter(|h| h.focusable).map(|h| h.id).collect();
        if let Some(f) = self.focused
            && !focus_chain.contains(&f)
        {
            self.focused = None;
        }

        Frame {
            root,
            scene,
            hit_regions: hits,
            semantics_nodes: sem,
            focus_chain,
        }
    }
}
