//! Unicode normalization options shared between the query pipeline (which
//! normalizes the user's query before it reaches the store) and the scorer
//! UDF (which must normalize each stored directory's decoded codepoints
//! identically, since `dir` is persisted as raw, un-normalized OS bytes).

use bitflags::bitflags;
use unicode_normalization::UnicodeNormalization;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NormalizeOptions: u8 {
        /// NFKC: compatibility decomposition followed by canonical composition.
        const COMPATIBILITY_COMPOSE = 0b0001;
        /// Drop codepoints with no assigned Unicode meaning.
        const STRIP_UNASSIGNED = 0b0010;
        /// Fold case so comparisons are case-insensitive.
        const CASE_FOLD = 0b0100;
    }
}

impl NormalizeOptions {
    pub fn to_byte(self) -> u8 {
        self.bits()
    }

    pub fn from_byte(byte: u8) -> Self {
        NormalizeOptions::from_bits_truncate(byte)
    }
}

/// Applies `opts` to `codepoints`, returning the normalized sequence.
///
/// Tagged invalid-UTF-8-byte codepoints (see `zsql_codec`) are never valid
/// Unicode scalar values and pass through untouched, but they are interleaved
/// back at their original position: only maximal *runs* of valid codepoints
/// between them are normalized, never the whole sequence collapsed into one
/// string first. Otherwise a tagged byte's position relative to its
/// neighbors would shift, changing which codepoint the Scorer's bonus table
/// sees as immediately preceding which — the bonus table's contract is
/// defined in terms of the real haystack's adjacency, not a reordered one.
pub fn normalize(codepoints: &[u32], opts: NormalizeOptions) -> Vec<u32> {
    let mut result = Vec::with_capacity(codepoints.len());
    let mut run: Vec<char> = Vec::new();

    for &cp in codepoints {
        match char::from_u32(cp) {
            Some(c) => run.push(c),
            None => {
                flush_run(&mut run, opts, &mut result);
                result.push(cp);
            }
        }
    }
    flush_run(&mut run, opts, &mut result);

    result
}

/// Normalizes one maximal run of valid codepoints and appends the result to
/// `out`, leaving `run` empty.
fn flush_run(run: &mut Vec<char>, opts: NormalizeOptions, out: &mut Vec<u32>) {
    if run.is_empty() {
        return;
    }

    let mut chars = std::mem::take(run);
    if opts.contains(NormalizeOptions::STRIP_UNASSIGNED) {
        chars.retain(|&c| is_assigned(c));
    }

    let text: String = chars.into_iter().collect();

    let text = if opts.contains(NormalizeOptions::COMPATIBILITY_COMPOSE) {
        text.nfkc().collect::<String>()
    } else {
        text
    };

    let text = if opts.contains(NormalizeOptions::CASE_FOLD) {
        caseless::default_case_fold_str(&text)
    } else {
        text
    };

    out.extend(text.chars().map(|c| c as u32));
}

/// A conservative "assigned" check good enough for path-like input:
/// noncharacters and private-use codepoints are treated as unassigned and
/// stripped. `char`'s mere existence in Rust already guarantees it is some
/// valid Unicode scalar value; this narrows further to exclude the ranges
/// the Unicode standard reserves as permanently unassigned or for
/// application-private use.
fn is_assigned(c: char) -> bool {
    let cp = c as u32;
    let is_noncharacter = (0xfdd0..=0xfdef).contains(&cp) || (cp & 0xfffe) == 0xfffe;
    let is_private_use = (0xe000..=0xf8ff).contains(&cp)
        || (0xf0000..=0xffffd).contains(&cp)
        || (0x100000..=0x10fffd).contains(&cp);
    !is_noncharacter && !is_private_use
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runes(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    #[test]
    fn no_options_is_a_no_op() {
        let input = runes("Café");
        assert_eq!(normalize(&input, NormalizeOptions::empty()), input);
    }

    #[test]
    fn case_fold_lowercases_ascii_and_beyond() {
        let input = runes("SITE");
        let folded = normalize(&input, NormalizeOptions::CASE_FOLD);
        assert_eq!(folded, runes("site"));
    }

    #[test]
    fn compatibility_compose_merges_decomposed_forms() {
        // "e" + combining acute accent (U+0301) should compose to "é" under NFKC.
        let decomposed = vec!['e' as u32, 0x0301];
        let normalized = normalize(&decomposed, NormalizeOptions::COMPATIBILITY_COMPOSE);
        assert_eq!(normalized, runes("é"));
    }

    #[test]
    fn tagged_invalid_bytes_pass_through_untouched() {
        let tagged = 0xff | 0x7000_0000;
        let input = vec!['a' as u32, tagged];
        let normalized = normalize(&input, NormalizeOptions::CASE_FOLD);
        assert!(normalized.contains(&tagged));
    }

    #[test]
    fn tagged_bytes_keep_their_original_interleaved_position() {
        // a / <invalid byte> b  ->  the tag must stay between '/' and 'b',
        // not get shuffled to the end of the sequence.
        let tagged = 0xff | 0x7000_0000;
        let input = vec!['a' as u32, '/' as u32, tagged, 'b' as u32];
        let normalized = normalize(&input, NormalizeOptions::CASE_FOLD);
        assert_eq!(normalized, vec!['a' as u32, '/' as u32, tagged, 'b' as u32]);
    }

    #[test]
    fn normalizes_each_valid_run_around_tagged_bytes_independently() {
        let tagged = 0xff | 0x7000_0000;
        let input = vec!['S' as u32, 'I' as u32, tagged, 'T' as u32, 'E' as u32];
        let normalized = normalize(&input, NormalizeOptions::CASE_FOLD);
        assert_eq!(
            normalized,
            vec!['s' as u32, 'i' as u32, tagged, 't' as u32, 'e' as u32]
        );
    }
}
