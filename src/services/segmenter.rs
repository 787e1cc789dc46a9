// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use crate::config::{Config, Segmentation};
use crate::domain::ScriptUnit;

/// How submitted text is cut into units.
#[derive(Debug, Clone)]
pub enum Segmenter {
    /// Overlapping character windows; the last one may be shorter.
    FixedWindow { size: usize, overlap: usize },
    /// A line starting with one of `markers` opens a new unit. Units longer
    /// than `max_chars` are split again at line boundaries.
    SceneBoundary {
        markers: Vec<String>,
        max_chars: usize,
    },
}

impl Segmenter {
    pub fn from_config(config: &Config) -> Self {
        match config.segmentation {
            Segmentation::Window => Self::FixedWindow {
                size: config.chunk_size,
                overlap: config.chunk_overlap,
            },
            Segmentation::Scenes => Self::SceneBoundary {
                markers: config.scene_markers.clone(),
                max_chars: config.chunk_size,
            },
        }
    }

    /// Split `text` into ordered units. Empty (or whitespace-only) input
    /// yields no units.
    pub fn segment(&self, text: &str) -> Vec<ScriptUnit> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let pieces = match self {
            Self::FixedWindow { size, overlap } => window_chunks(text, *size, *overlap),
            Self::SceneBoundary { markers, max_chars } => {
                let markers: Vec<String> = markers
                    .iter()
                    .map(|m| m.trim().to_lowercase())
                    .filter(|m| !m.is_empty())
                    .collect();

                split_scenes(text, &markers)
                    .into_iter()
                    .flat_map(|scene| split_long(&scene, *max_chars))
                    .filter(|piece| !piece.trim().is_empty())
                    .collect()
            }
        };

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| ScriptUnit { index, text })
            .collect()
    }
}

/// Overlapping windows of `size` characters advancing by `size - overlap`.
pub fn window_chunks(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    // Byte offset of every char plus the end, so slicing never splits a char
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    bounds.push(text.len());
    let len = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len {
        let end = (start + size).min(len);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        if end == len {
            break;
        }
        start += step;
    }

    chunks
}

fn split_scenes(text: &str, markers: &[String]) -> Vec<String> {
    let mut scenes = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if is_boundary(line, markers) && !current.is_empty() {
            scenes.push(current.join("\n"));
            current.clear();
        }
        current.push(line);
    }

    if !current.is_empty() {
        scenes.push(current.join("\n"));
    }

    scenes
}

/// Case-insensitive prefix match. A marker ending in a letter must be
/// followed by a non-letter, so `SCENE` does not match `Scenery`.
fn is_boundary(line: &str, markers: &[String]) -> bool {
    let lowered = line.trim_start().to_lowercase();

    markers.iter().any(|marker| {
        let Some(rest) = lowered.strip_prefix(marker.as_str()) else {
            return false;
        };
        let needs_break = marker.chars().last().is_some_and(char::is_alphabetic);
        !needs_break || !rest.chars().next().is_some_and(char::is_alphabetic)
    })
}

/// Split a scene longer than `max_chars` at line boundaries; a single line
/// longer than that is cut into character windows without overlap.
fn split_long(scene: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if scene.chars().count() <= max_chars {
        return vec![scene.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in scene.lines() {
        let line_chars = line.chars().count();

        if line_chars > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            pieces.extend(window_chunks(line, max_chars, 0));
            continue;
        }

        let needed = if current.is_empty() { line_chars } else { line_chars + 1 };
        if current_chars + needed > max_chars && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_chars += 1;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}
