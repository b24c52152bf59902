// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for RemotePath parsing and manipulation

#![no_main]

use dpn_core::path::RemotePath;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let path = RemotePath::new(input);

        // Rendering and reparsing must be stable
        let rendered = path.to_path_string();
        assert_eq!(RemotePath::new(&rendered), path);
        assert!(path.segments.iter().all(|s| !s.is_empty() && !s.contains('/')));

        let _ = path.name();
        let _ = path.parent();
        let _ = path.is_root();

        if let Some(prefix) = input.get(..10) {
            let _ = path.join(prefix);
        }
    }
});
