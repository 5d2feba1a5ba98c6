//! The interactive confirmation prompt used by forget mode. Kept separate
//! from the store so the store never touches a terminal.

use std::io::{self, Read, Write};

/// Prompts `Remove `<path>'? [Yn] ` on `out` and reads a single byte from
/// `input`. Anything other than `n`/`N` confirms, matching the `[Yn]`
/// default-yes convention; end-of-input (no byte available) aborts rather
/// than assuming consent.
pub fn confirm(path: &str, out: &mut impl Write, input: &mut impl Read) -> io::Result<bool> {
    write!(out, "Remove `{path}'? [Yn] ")?;
    out.flush()?;

    let mut byte = [0u8; 1];
    match input.read(&mut byte)? {
        0 => Ok(false),
        _ => Ok(!matches!(byte[0], b'n' | b'N')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_aborts() {
        let mut out = Vec::new();
        let mut input: &[u8] = b"";
        assert!(!confirm("/a/b", &mut out, &mut input).unwrap());
    }

    #[test]
    fn yes_confirms() {
        let mut out = Vec::new();
        let mut input: &[u8] = b"y\n";
        assert!(confirm("/a/b", &mut out, &mut input).unwrap());
    }

    #[test]
    fn bare_newline_confirms() {
        let mut out = Vec::new();
        let mut input: &[u8] = b"\n";
        assert!(confirm("/a/b", &mut out, &mut input).unwrap());
    }

    #[test]
    fn no_aborts() {
        let mut out = Vec::new();
        let mut input: &[u8] = b"n\n";
        assert!(!confirm("/a/b", &mut out, &mut input).unwrap());
    }

    #[test]
    fn uppercase_no_aborts() {
        let mut out = Vec::new();
        let mut input: &[u8] = b"N\n";
        assert!(!confirm("/a/b", &mut out, &mut input).unwrap());
    }

    #[test]
    fn prompt_names_the_path() {
        let mut out = Vec::new();
        let mut input: &[u8] = b"y";
        confirm("/home/u/site", &mut out, &mut input).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Remove `/home/u/site'? [Yn] ");
    }
}
