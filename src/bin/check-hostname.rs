use std::env::args_os;
use std::error::Error;
use std::io::{self, Write, stdout};
use std::os::unix::ffi::OsStrExt;
use std::process::ExitCode;

use check_hostname::report::{USAGE, checking, failure, success};
use check_hostname::{Config, resolve_first_address};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let mut args = args_os().skip(1);
    let (Some(host), None) = (args.next(), args.next()) else {
        return exit(stdout().lock().write_all(USAGE.as_bytes()), false);
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            return exit(writeln!(stdout().lock(), "check-hostname: {err}"), false);
        }
    };

    let mut out = stdout().lock();
    if let Err(err) = checking(&mut out, host.as_bytes()) {
        return exit(Err(err), false);
    }
    match resolve_first_address(host.as_bytes(), &config) {
        Ok(addr) => exit(success(&mut out, addr), true),
        Err(err) => {
            log::debug!("lookup failed: {err}");
            let mut source = err.source();
            while let Some(err) = source {
                log::debug!("caused by: {err}");
                source = err.source();
            }
            exit(failure(&mut out, &err), false)
        }
    }
}

fn exit(written: io::Result<()>, resolved: bool) -> ExitCode {
    match written {
        Ok(()) if resolved => ExitCode::SUCCESS,
        Ok(()) => ExitCode::FAILURE,
        Err(err) => {
            log::debug!("could not write to stdout: {err}");
            ExitCode::FAILURE
        }
    }
}
