use rand::seq::SliceRandom;
use unicode_segmentation::UnicodeSegmentation;

use crate::CARD_PALETTE;

/// Picks a card accent colour at random from the fixed palette
pub fn random_card_color() -> String {
    CARD_PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(CARD_PALETTE[0])
        .to_string()
}

/// Whether `input` is exactly one emoji, as accepted for a note icon
pub fn is_single_emoji(input: &str) -> bool {
    let mut graphemes = input.graphemes(true);
    let grapheme = match (graphemes.next(), graphemes.next()) {
        (Some(g), None) => g,
        _ => return false,
    };

    // Keycaps such as 1️⃣ start with an ASCII digit.
    if grapheme.contains('\u{20E3}') {
        return true;
    }
    grapheme.chars().any(is_emoji_char)
        && !grapheme.chars().any(|c| c.is_ascii_alphanumeric())
}

fn is_emoji_char(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF
        | 0x2600..=0x27BF
        | 0x2300..=0x23FF
        | 0x2B00..=0x2BFF
        | 0x2190..=0x21FF
        | 0x3030 | 0x303D | 0x3297 | 0x3299
        | 0x00A9 | 0x00AE | 0x203C | 0x2049 | 0x2122 | 0x2139)
}

/// Trims a hashtag and strips its leading `#` marks
pub fn normalize_hashtag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').trim().to_string()
}

/// Truncates `text` to at most `max_chars` graphemes, appending `…` when cut
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max_chars {
        return text.to_string();
    }
    let mut out: String = graphemes[..max_chars].concat();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}
