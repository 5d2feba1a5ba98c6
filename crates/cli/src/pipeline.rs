//! Translates the user's positional arguments into a normalized query
//! entity ready to hand to the store: joins the arguments, detects
//! case-sensitivity, and decomposes/normalizes via the path codec and the
//! Unicode normalization options.

use std::ffi::OsString;

use zsql_store::NormalizeOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Smart,
    Sensitive,
    Insensitive,
}

/// Joins positional query arguments into a single byte string with a
/// single ASCII space between each (see the multi-argument open question
/// resolved in the design notes: space-joining, not concatenation).
///
/// Uses raw OS bytes rather than `String` so a query argument containing
/// invalid UTF-8 is preserved exactly, matching how `dir` bytes are stored.
#[cfg(unix)]
pub fn join_args(args: &[OsString]) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;

    let mut joined = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            joined.push(b' ');
        }
        joined.extend_from_slice(arg.as_bytes());
    }
    joined
}

#[cfg(not(unix))]
pub fn join_args(args: &[OsString]) -> Vec<u8> {
    args.iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
        .into_bytes()
}

/// Scans `bytes` (decoded through the path codec) for any upper-case
/// codepoint, used by smart-case to decide whether to fold.
fn contains_uppercase(codepoints: &[u32]) -> bool {
    codepoints
        .iter()
        .filter_map(|&cp| char::from_u32(cp))
        .any(|c| c.is_uppercase())
}

/// Builds the normalized query codepoints and the options used to produce
/// them, ready for [`zsql_store::Store::search_best`].
pub fn build_query(args: &[OsString], case_mode: CaseMode) -> (Vec<u32>, NormalizeOptions) {
    let joined = join_args(args);
    let codepoints = zsql_codec::encode(&joined);

    let fold = match case_mode {
        CaseMode::Sensitive => false,
        CaseMode::Insensitive => true,
        CaseMode::Smart => !contains_uppercase(&codepoints),
    };

    let mut opts = NormalizeOptions::COMPATIBILITY_COMPOSE | NormalizeOptions::STRIP_UNASSIGNED;
    if fold {
        opts |= NormalizeOptions::CASE_FOLD;
    }

    let normalized = zsql_store::normalize(&codepoints, opts);
    (normalized, opts)
}
