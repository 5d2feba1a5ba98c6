mod cli;
mod forget;
mod pipeline;
mod shell;

use std::ffi::OsString;
use std::io;
use std::process::ExitCode;
use std::sync::OnceLock;

use clap::Parser;

use cli::Mode;
use zsql_runtime::Error;
use zsql_store::Store;

static PROGRAM_NAME: OnceLock<String> = OnceLock::new();

fn program_name() -> &'static str {
    PROGRAM_NAME.get_or_init(|| {
        std::env::args()
            .next()
            .unwrap_or_else(|| zsql_runtime::config::PROGRAM_NAME.to_string())
    })
}

fn main() -> ExitCode {
    zsql_runtime::init().ok();
    program_name();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = err.print_chain(program_name(), &mut io::stderr());
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Error> {
    let request = cli::resolve(cli::Args::parse())?;

    match request.mode {
        Mode::EmitShellScript => {
            print!("{}", shell::INTEGRATION_SCRIPT);
            Ok(())
        }
        Mode::Add => run_add(&request.query),
        Mode::Search => run_search(&request),
        Mode::Forget => run_forget(&request),
    }
}

fn run_add(query: &[OsString]) -> Result<(), Error> {
    let dir_bytes = pipeline::join_args(query);
    let store = Store::open()?;
    store.add(&dir_bytes)
}

fn run_search(request: &cli::Request) -> Result<(), Error> {
    let (codepoints, opts) = pipeline::build_query(&request.query, request.case_mode);
    let store = Store::open()?;

    let found = store
        .search_best(&codepoints, opts)?
        .ok_or_else(|| Error::not_found("no matching directory"))?;

    print_path_with_sentinel(&found.dir);
    Ok(())
}

fn run_forget(request: &cli::Request) -> Result<(), Error> {
    let (codepoints, opts) = pipeline::build_query(&request.query, request.case_mode);
    let store = Store::open()?;

    let found = store
        .search_best(&codepoints, opts)?
        .ok_or_else(|| Error::not_found("no matching directory"))?;

    let path = String::from_utf8_lossy(&found.dir).into_owned();
    let confirmed = forget::confirm(&path, &mut io::stdout(), &mut io::stdin())
        .map_err(|e| Error::system_from_io(&e))?;

    if confirmed {
        store.delete(found.id)?;
    }
    Ok(())
}

/// Writes the decoded path followed by the literal `$` sentinel the shell
/// wrapper strips off (`${var%?}`), with no trailing newline.
fn print_path_with_sentinel(path: &[u8]) {
    use std::io::Write;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = out.write_all(path);
    let _ = out.write_all(b"$");
    let _ = out.flush();
}
