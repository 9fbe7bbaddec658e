//! Process-wide image table.
//!
//! Views refer to images by [`ImageHandle`], a stable hash of the resource
//! name. Pixels are registered once (usually at startup) and shared by the
//! layout pass and the GPU backend. An unregistered handle is not an error:
//! it is painted as a placeholder.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::UiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageHandle(pub u64);

impl ImageHandle {
    pub const fn named(name: &str) -> Self {
        ImageHandle(stable_key(name))
    }
}

/// FNV-1a over `name`: the same string gives the same key on every run.
pub const fn stable_key(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        i += 1;
    }
    hash
}

/// Decoded RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct ImageSource {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
    /// Bumped on every registration; backends re-upload when it changes.
    pub generation: u64,
}

impl ImageSource {
    pub fn new(name: &str, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, UiError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(UiError::ImageDecode {
                name: name.to_string(),
                reason: format!(
                    "expected {expected} bytes for {width}x{height} RGBA, got {}",
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
            generation: 0,
        })
    }
}

static IMAGES: LazyLock<RwLock<HashMap<ImageHandle, Arc<ImageSource>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));
static GENERATION: AtomicU64 = AtomicU64::new(1);

pub fn register_image(handle: ImageHandle, mut source: ImageSource) {
    source.generation = GENERATION.fetch_add(1, Ordering::Relaxed);
    log::debug!(
        "register_image: {:?} {}x{} gen {}",
        handle,
        source.width,
        source.height,
        source.generation
    );
    IMAGES.write().insert(handle, Arc::new(source));
}

pub fn unregister_image(handle: ImageHandle) -> bool {
    IMAGES.write().remove(&handle).is_some()
}

pub fn image(handle: ImageHandle) -> Option<Arc<ImageSource>> {
    IMAGES.read().get(&handle).cloned()
}

pub fn is_registered(handle: ImageHandle) -> bool {
    IMAGES.read().contains_key(&handle)
}
