#![no_main]

use imagewarden_core::types::ImageRef;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Ok(image) = ImageRef::parse(raw) {
            let normalized = image.as_str();
            assert!(!normalized.is_empty());
            assert!(!normalized.contains(' '));

            let key = image.artifact_key();
            assert!(!key.contains('/'));
            assert!(!key.contains(':'));
        }
    }
});
