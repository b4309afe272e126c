/*!
 * Boundary-aware text segmentation.
 *
 * Long chapters are split into provider-safe segments at sentence or
 * paragraph boundaries. The segmenter targets a soft segment size, then
 * scans forward for the nearest sentence-ending marker, preferring a
 * paragraph break when one immediately follows. A hard cut at 1.5x the
 * target size guarantees termination and a bounded worst case.
 */

/// Sentence-ending markers recognized as valid cut points.
///
/// Order matters only for readability; the scanner always picks the
/// earliest occurrence of any marker. Closing-quote and bracket-close
/// variants cover dialogue-heavy prose.
const SENTENCE_MARKERS: &[&str] = &[
    ". ",
    "? ",
    "! ",
    ".\" ",
    "?\" ",
    "!\" ",
    ".' ",
    "?' ",
    "!' ",
    ".\u{201d} ",
    "?\u{201d} ",
    "!\u{201d} ",
    ".) ",
    "?) ",
    "!) ",
    ".] ",
    ".\n",
    "?\n",
    "!\n",
    ".\"\n",
    "?\"\n",
    "!\"\n",
    ".\u{201d}\n",
    "?\u{201d}\n",
    "!\u{201d}\n",
];

/// Splits source text into bounded, ordered segments.
pub struct Segmenter;

impl Segmenter {
    /// Split `text` into segments of roughly `segment_size` characters.
    ///
    /// With `segment_size` of `None` the text passes through as a single
    /// trimmed segment. Segments are trimmed and empty results dropped;
    /// ordering follows the source text.
    pub fn segment(text: &str, segment_size: Option<usize>) -> Vec<String> {
        let Some(size) = segment_size else {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            return vec![trimmed.to_string()];
        };

        if size == 0 {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            return vec![trimmed.to_string()];
        }

        let mut segments = Vec::new();
        let len = text.len();
        let mut pos = 0usize;

        while pos < len {
            let target = floor_char_boundary(text, pos.saturating_add(size).min(len));

            // Remaining tail fits in one segment.
            if target >= len {
                push_trimmed(&mut segments, &text[pos..]);
                break;
            }

            // Hard upper bound: 1.5x the target size.
            let limit = floor_char_boundary(text, pos.saturating_add(size + size / 2).min(len));

            let cut = match find_earliest_marker(&text[target..limit]) {
                Some(marker_end) => {
                    let mut cut = target + marker_end;
                    // Prefer a paragraph boundary when one sits inside the
                    // whitespace run right after the sentence end.
                    let ws_end = cut
                        + text[cut..]
                            .char_indices()
                            .find(|(_, c)| !c.is_whitespace())
                            .map_or(len - cut, |(i, _)| i);
                    if text[cut..ws_end].contains("\n\n") {
                        cut = ws_end;
                    }
                    cut
                }
                None if limit >= len => len,
                // No marker inside the tolerance window: force-cut so the
                // segment stays bounded.
                None => limit,
            };

            // A cut that fails to advance would loop forever.
            let cut = cut.max(next_char_boundary(text, pos + 1)).min(len);

            push_trimmed(&mut segments, &text[pos..cut]);
            pos = cut;
        }

        segments
    }
}

/// Find the earliest sentence marker in `window`, returning the byte offset
/// just past the marker.
fn find_earliest_marker(window: &str) -> Option<usize> {
    SENTENCE_MARKERS
        .iter()
        .filter_map(|marker| window.find(marker).map(|at| at + marker.len()))
        .min()
}

fn push_trimmed(segments: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
}

/// Largest char boundary less than or equal to `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary greater than or equal to `index`.
fn next_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
