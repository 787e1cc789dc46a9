// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

#![no_main]

use libfuzzer_sys::fuzz_target;
use scriptrate::services::sanitizer::{ParseOutcome, ResponseSanitizer};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let ParseOutcome::Parsed(record) = ResponseSanitizer::parse(&raw) {
        assert!(record.is_complete());
    }
});
