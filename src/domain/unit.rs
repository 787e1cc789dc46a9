// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

/// Placeholder substituted for `{context}` when retrieval returned nothing.
pub const NO_CONTEXT_MARKER: &str = "(no regulatory context available)";

/// A contiguous span of the submitted text, classified on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptUnit {
    /// Position in the source document (0-based, dense).
    pub index: usize,
    pub text: String,
}

/// One passage returned by the retrieval index.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// 0 is the most relevant.
    pub rank: usize,
    pub score: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub passages: Vec<Passage>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.passages.iter().all(|p| p.text.trim().is_empty())
    }

    /// Passage texts in rank order, blank ones skipped, or the no-context marker.
    pub fn to_prompt_context(&self) -> String {
        let mut passages: Vec<&Passage> = self
            .passages
            .iter()
            .filter(|p| !p.text.trim().is_empty())
            .collect();

        if passages.is_empty() {
            return NO_CONTEXT_MARKER.to_string();
        }

        passages.sort_by_key(|p| p.rank);
        passages
            .iter()
            .map(|p| p.text.trim())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(rank: usize, text: &str) -> Passage {
        Passage {
            rank,
            score: 1.0,
            text: text.into(),
        }
    }

    #[test]
    fn empty_context_renders_marker() {
        let ctx = RetrievedContext::default();
        assert!(ctx.is_empty());
        assert_eq!(ctx.to_prompt_context(), NO_CONTEXT_MARKER);
    }

    #[test]
    fn passages_join_in_rank_order() {
        let ctx = RetrievedContext {
            passages: vec![passage(1, "second"), passage(0, "first"), passage(2, "  ")],
        };
        assert_eq!(ctx.to_prompt_context(), "first\nsecond");
    }
}
