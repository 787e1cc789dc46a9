// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

pub mod aggregator;
pub mod classifier;
pub mod corpus;
pub mod guided;
pub mod llm;
pub mod pipeline;
pub mod resolver;
pub mod retrieval;
pub mod sanitizer;
pub mod segmenter;
