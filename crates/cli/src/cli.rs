//! Flag parsing and the mode/validation rules layered on top of it. Unlike
//! a subcommand-based CLI, zsql takes a flat set of getopt-style flags plus
//! a variable-length positional query.

use std::ffi::OsString;

use clap::Parser;

use zsql_runtime::Error;

use crate::pipeline::CaseMode;

#[derive(Parser, Debug)]
#[command(name = "zsql", about = "a frecency-ranked directory jumper", version)]
pub struct Args {
    /// Add mode: insert/update the single directory argument.
    #[arg(short = 'a')]
    pub add: bool,

    /// Force case-sensitive matching.
    #[arg(short = 'c')]
    pub case_sensitive: bool,

    /// Force case-insensitive (folded) matching.
    #[arg(short = 'i')]
    pub ignore_case: bool,

    /// Forget mode: search, then prompt for deletion.
    #[arg(short = 'f')]
    pub forget: bool,

    /// Print the shell integration script and exit.
    #[arg(short = 'S')]
    pub shell: bool,

    #[arg(trailing_var_arg = true)]
    pub query: Vec<OsString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    Add,
    Forget,
    EmitShellScript,
}

pub struct Request {
    pub mode: Mode,
    pub case_mode: CaseMode,
    pub query: Vec<OsString>,
}

/// Validates the parsed flags and settles on a single mode, surfacing the
/// flag-combination rules §7 calls out as user errors.
pub fn resolve(args: Args) -> Result<Request, Error> {
    if args.shell {
        return Ok(Request {
            mode: Mode::EmitShellScript,
            case_mode: CaseMode::Smart,
            query: Vec::new(),
        });
    }

    if args.case_sensitive && args.ignore_case {
        return Err(Error::user("-c and -i are mutually exclusive"));
    }
    let case_mode = if args.case_sensitive {
        CaseMode::Sensitive
    } else if args.ignore_case {
        CaseMode::Insensitive
    } else {
        CaseMode::Smart
    };

    if args.add {
        if args.forget {
            return Err(Error::user("-a and -f are mutually exclusive"));
        }
        if args.query.len() != 1 {
            return Err(Error::user("-a requires exactly one directory argument"));
        }
        return Ok(Request {
            mode: Mode::Add,
            case_mode,
            query: args.query,
        });
    }

    if args.query.is_empty() {
        return Err(Error::user("no search specified"));
    }

    let mode = if args.forget { Mode::Forget } else { Mode::Search };
    Ok(Request {
        mode,
        case_mode,
        query: args.query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["zsql"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    #[test]
    fn no_query_is_a_user_error() {
        let err = resolve(parse(&[])).unwrap_err();
        assert_eq!(err.kind(), zsql_runtime::ErrorKind::User);
    }

    #[test]
    fn case_sensitive_and_ignore_case_together_is_a_user_error() {
        let err = resolve(parse(&["-c", "-i", "site"])).unwrap_err();
        assert_eq!(err.kind(), zsql_runtime::ErrorKind::User);
    }

    #[test]
    fn add_with_two_arguments_is_a_user_error() {
        let err = resolve(parse(&["-a", "one", "two"])).unwrap_err();
        assert_eq!(err.kind(), zsql_runtime::ErrorKind::User);
    }

    #[test]
    fn add_with_one_argument_resolves_to_add_mode() {
        let req = resolve(parse(&["-a", "/a/b"])).unwrap();
        assert_eq!(req.mode, Mode::Add);
    }

    #[test]
    fn forget_flag_resolves_to_forget_mode() {
        let req = resolve(parse(&["-f", "site"])).unwrap();
        assert_eq!(req.mode, Mode::Forget);
    }

    #[test]
    fn shell_flag_short_circuits_everything_else() {
        let req = resolve(parse(&["-S", "-a", "-c", "-i"])).unwrap();
        assert_eq!(req.mode, Mode::EmitShellScript);
    }

    #[test]
    fn bare_query_resolves_to_search_mode() {
        let req = resolve(parse(&["site"])).unwrap();
        assert_eq!(req.mode, Mode::Search);
        assert_eq!(req.query, vec![OsString::from("site")]);
    }
}
