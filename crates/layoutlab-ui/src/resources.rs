//! Decoding image resources into the shared image table.

use std::path::Path;

use layoutlab_core::*;

/// Decodes PNG/JPEG bytes into an RGBA8 `ImageSource`.
pub fn decode_image(name: &str, bytes: &[u8]) -> Result<ImageSource, UiError> {
    let img = image::load_from_memory(bytes).map_err(|e| UiError::ImageDecode {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    ImageSource::new(name, w, h, rgba.into_raw())
}

pub fn load_image_file(name: &str, path: &Path) -> Result<ImageSource, UiError> {
    let bytes = std::fs::read(path).map_err(|source| UiError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(name, &bytes)
}

/// Decodes and registers `bytes` under `ImageHandle::named(name)`. Failures
/// are logged and leave the handle unregistered, so views fall back to the
/// placeholder.
pub fn register_image_bytes(name: &str, bytes: &[u8]) -> Option<ImageHandle> {
    match decode_image(name, bytes) {
        Ok(src) => {
            let handle = ImageHandle::named(name);
            register_image(handle, src);
            Some(handle)
        }
        Err(e) => {
            log::warn!("image resource '{name}' not loaded: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = decode_image("broken", b"not an image").unwrap_err();
        assert!(matches!(err, UiError::ImageDecode { ref name, .. } if name == "broken"));
        assert!(register_image_bytes("broken", b"nope").is_none());
        assert!(!is_registered(ImageHandle::named("broken")));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_image_file("x", Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, UiError::Io { .. }));
    }
}
