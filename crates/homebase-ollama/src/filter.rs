//! Removal of model reasoning ("thinking") markup.

use lazy_static::lazy_static;
use regex::Regex;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

lazy_static! {
    // Non-greedy and dot-matches-newline: each opening marker pairs with the
    // nearest closing marker after it.
    static ref THINKING_BLOCK: Regex = Regex::new(&format!(
        "(?s){}.*?{}",
        regex::escape(THINK_OPEN),
        regex::escape(THINK_CLOSE)
    ))
    .expect("thinking pattern is valid");
}

/// Strip every complete `<think>...</think>` block, delimiters included.
///
/// Unmatched markers are kept as-is.
pub fn filter_thinking(text: &str) -> String {
    THINKING_BLOCK.replace_all(text, "").into_owned()
}
