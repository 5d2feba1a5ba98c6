//! Two-stage Unicode-aware fuzzy matcher. Given a candidate ("haystack")
//! codepoint sequence and a query ("needle") codepoint sequence, produces a
//! single `f64` score: higher is better, `f64::NEG_INFINITY` means "does
//! not match and must not appear in results".
//!
//! Stage 1 is a cheap subsequence filter that short-circuits the common
//! cases (empty query, no match, exact match). Stage 2 is a dynamic-
//! programming ranker that only runs when a real alignment decision is
//! needed, using two rolling matrix rows rather than a full `|N| x |H|`
//! table.

use smallvec::SmallVec;
use unicode_general_category::{GeneralCategory, get_general_category};

pub const BONUS_SLASH: f64 = 4500.0;
pub const BONUS_BOUNDARY: f64 = 4000.0;
pub const BONUS_PERIOD: f64 = 3000.0;
pub const BONUS_CONSECUTIVE: f64 = 5000.0;
pub const SCORE_GAP_INNER: f64 = -200.0;
pub const SCORE_GAP_LEADING: f64 = -50.0;
pub const SCORE_GAP_TRAILING: f64 = -200.0;
pub const SCORE_MATCH: f64 = 1_000_000.0;

const SLASH: u32 = '/' as u32;
const PERIOD: u32 = '.' as u32;

/// Inline capacity for the row buffers and word-flag table before they
/// spill to the heap; sized for a typical filesystem path.
const STACK_CODEPOINTS: usize = 1024;

type Row = SmallVec<[f64; STACK_CODEPOINTS]>;
type Flags = SmallVec<[bool; STACK_CODEPOINTS]>;

/// Scores `needle` against `haystack`. See module docs for the return
/// value's meaning.
pub fn score(haystack: &[u32], needle: &[u32]) -> f64 {
    match cheap_filter(haystack, needle) {
        Filter::Score(s) => s,
        Filter::NoMatch => f64::NEG_INFINITY,
        Filter::NeedsRank => rank(haystack, needle),
    }
}

enum Filter {
    Score(f64),
    NoMatch,
    NeedsRank,
}

/// Stage 1: a cheap left-to-right subsequence walk. Never allocates.
fn cheap_filter(haystack: &[u32], needle: &[u32]) -> Filter {
    if needle.is_empty() {
        return Filter::Score(0.0);
    }
    if needle.len() > haystack.len() {
        return Filter::NoMatch;
    }

    let mut n = 0;
    for &h in haystack {
        if n < needle.len() && h == needle[n] {
            n += 1;
        }
    }

    if n < needle.len() {
        return Filter::NoMatch;
    }

    if needle.len() == haystack.len() {
        // A same-length subsequence match is necessarily an exact match.
        return Filter::Score(SCORE_MATCH);
    }

    Filter::NeedsRank
}

/// Stage 2: the dynamic-programming ranker. `M[i][j]` is the best score of
/// an alignment ending with a match at `haystack[j]`; `S[i][j]` is the best
/// score using `haystack[0..=j]` whether or not it ends in a match. Only
/// the previous and current rows of each matrix are kept at once.
fn rank(haystack: &[u32], needle: &[u32]) -> f64 {
    let h_len = haystack.len();
    let n_len = needle.len();

    let bonus = bonus_table(haystack);

    let mut m_prev: Row = SmallVec::from_elem(f64::NEG_INFINITY, h_len);
    let mut s_prev: Row = SmallVec::from_elem(f64::NEG_INFINITY, h_len);
    let mut m_curr: Row = SmallVec::from_elem(f64::NEG_INFINITY, h_len);
    let mut s_curr: Row = SmallVec::from_elem(f64::NEG_INFINITY, h_len);

    for i in 0..n_len {
        let gap = if i == n_len - 1 {
            SCORE_GAP_TRAILING
        } else {
            SCORE_GAP_INNER
        };

        for j in 0..h_len {
            if needle[i] != haystack[j] {
                m_curr[j] = f64::NEG_INFINITY;
            } else if i == 0 {
                m_curr[j] = (j as f64) * SCORE_GAP_LEADING + bonus[j];
            } else if j == 0 {
                // No predecessor column exists for a non-leading row.
                m_curr[j] = f64::NEG_INFINITY;
            } else {
                m_curr[j] = (s_prev[j - 1] + bonus[j]).max(m_prev[j - 1] + BONUS_CONSECUTIVE);
            }

            s_curr[j] = if j == 0 {
                m_curr[j]
            } else {
                m_curr[j].max(s_curr[j - 1] + gap)
            };
        }

        std::mem::swap(&mut m_prev, &mut m_curr);
        std::mem::swap(&mut s_prev, &mut s_curr);
    }

    s_prev[h_len - 1]
}

/// Computes `bonus[j]` for every position in `haystack`, derived from the
/// codepoint immediately preceding `haystack[j]`.
fn bonus_table(haystack: &[u32]) -> Row {
    let flags = word_flags(haystack);
    let mut bonus: Row = SmallVec::with_capacity(haystack.len());

    for j in 0..haystack.len() {
        let b = if j == 0 {
            0.0
        } else {
            let prior = haystack[j - 1];
            if prior == SLASH {
                BONUS_SLASH
            } else if prior == PERIOD {
                BONUS_PERIOD
            } else if !flags[j - 1] && flags[j] {
                BONUS_BOUNDARY
            } else {
                0.0
            }
        };
        bonus.push(b);
    }

    bonus
}

/// Classifies every codepoint in `haystack` as a "word" character or not.
/// `Mc` (spacing combining mark) inherits the previous codepoint's
/// classification; tagged invalid-byte codepoints are never word
/// characters.
fn word_flags(haystack: &[u32]) -> Flags {
    let mut flags: Flags = SmallVec::with_capacity(haystack.len());
    let mut prev = false;

    for &rune in haystack {
        let is_word = match char::from_u32(rune).map(get_general_category) {
            Some(
                GeneralCategory::LowercaseLetter
                | GeneralCategory::UppercaseLetter
                | GeneralCategory::TitlecaseLetter
                | GeneralCategory::ModifierLetter
                | GeneralCategory::OtherLetter
                | GeneralCategory::DecimalNumber,
            ) => true,
            Some(GeneralCategory::SpacingMark) => prev,
            _ => false,
        };
        flags.push(is_word);
        prev = is_word;
    }

    flags
}
