//! Anonymous contractor labels (A, B, C, ...)
//!
//! A label is the zero-based position of a match in the creation-ordered
//! list of matches for its request. Every surface must derive it from that
//! same ordering, so the helpers here take the ordered list rather than an
//! index chosen by the caller.

use crate::Match;

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Letter for the first 26 positions, then the 1-based number.
pub fn contractor_label(index: usize) -> String {
    match LETTERS.get(index) {
        Some(letter) => char::from(*letter).to_string(),
        None => (index + 1).to_string(),
    }
}

/// Label of `match_id` within `ordered`, which must be sorted by creation
/// time (as returned by `MarketStore::list_matches_for_request`).
pub fn label_for(ordered: &[Match], match_id: &str) -> Option<String> {
    ordered
        .iter()
        .position(|m| m.id == match_id)
        .map(contractor_label)
}
