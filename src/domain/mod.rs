// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

mod rating;
mod schema;
mod severity;
mod unit;

pub use rating::*;
pub use schema::*;
pub use severity::*;
pub use unit::*;
