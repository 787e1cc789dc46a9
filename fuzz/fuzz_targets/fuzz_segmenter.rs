// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

#![no_main]

use libfuzzer_sys::fuzz_target;
use scriptrate::services::segmenter::Segmenter;

fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fuzz_target!(|data: &[u8]| {
    let Some((&size, rest)) = data.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(rest);

    let scenes = Segmenter::SceneBoundary {
        markers: vec!["INT.".into(), "EXT.".into(), "СЦЕНА".into()],
        max_chars: usize::from(size).max(1),
    };
    let units = scenes.segment(&text);
    let joined: String = units.iter().map(|u| u.text.as_str()).collect();
    assert_eq!(strip_ws(&joined), strip_ws(&text));

    let windows = Segmenter::FixedWindow {
        size: usize::from(size).max(1),
        overlap: 0,
    };
    let joined: String = windows.segment(&text).into_iter().map(|u| u.text).collect();
    if !text.trim().is_empty() {
        assert_eq!(joined, text);
    }
});
