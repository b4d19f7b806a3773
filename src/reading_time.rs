use crate::post::ContentBlock;
use crate::richtext;

pub const WORDS_PER_MINUTE: u32 = 200;

/// Count words in `text`, treating runs of spaces and commas as one delimiter.
///
/// Non-breaking spaces count as spaces. Empty tokens produced by leading or
/// trailing delimiters are not counted.
pub fn count_words(text: &str) -> u32 {
    text.replace('\u{a0}', " ")
        .split([' ', ','])
        .filter(|token| !token.is_empty())
        .count() as u32
}

/// Estimated reading time in whole minutes, rounded up.
pub fn estimate(content: &[ContentBlock]) -> u32 {
    let total: u32 = content
        .iter()
        .map(|block| count_words(&richtext::as_text(&block.body)) + count_words(&block.heading))
        .sum();
    total.div_ceil(WORDS_PER_MINUTE)
}
