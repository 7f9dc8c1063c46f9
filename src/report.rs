//! The text `check-hostname` prints
//!
//! The format mirrors the classic C diagnostic, so that scripts scraping its output keep working:
//!
//! ```text
//! Checking gethostbyname(localhost)... first addr is 127.0.0.1
//! Checking gethostbyname(nonexistent.invalid)... returned NULL; h_errno = 1, Unknown host
//! ```

use std::io::{self, Write};
use std::net::Ipv4Addr;

use crate::resolve::ResolutionError;

/// Printed if the program was not called with exactly one argument.
pub const USAGE: &str = "usage: check-hostname HOSTNAME\n";

/// Start the report line. `host` is echoed byte by byte, and no line break is written.
pub fn checking(mut out: impl Write, host: &[u8]) -> io::Result<()> {
    out.write_all(b"Checking gethostbyname(")?;
    out.write_all(host)?;
    out.write_all(b")... ")?;
    out.flush()
}

/// Finish the report line after a successful lookup.
pub fn success(mut out: impl Write, addr: Ipv4Addr) -> io::Result<()> {
    writeln!(out, "first addr is {addr}")?;
    out.flush()
}

/// Finish the report line after a failed lookup.
pub fn failure(mut out: impl Write, err: &ResolutionError) -> io::Result<()> {
    writeln!(out, "returned NULL; h_errno = {}, {}", err.code(), err.kind())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostError;

    #[test]
    fn success_line() {
        let mut out = Vec::new();
        checking(&mut out, b"localhost").unwrap();
        assert_eq!(out, b"Checking gethostbyname(localhost)... ");
        success(&mut out, Ipv4Addr::LOCALHOST).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Checking gethostbyname(localhost)... first addr is 127.0.0.1\n",
        );
    }

    #[test]
    fn failure_line() {
        let mut out = Vec::new();
        checking(&mut out, b"this-host-does-not-exist.invalid").unwrap();
        failure(&mut out, &HostError::HostNotFound.into()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Checking gethostbyname(this-host-does-not-exist.invalid)... \
             returned NULL; h_errno = 1, Unknown host\n",
        );

        let mut out = Vec::new();
        failure(&mut out, &HostError::Internal.into()).unwrap();
        assert_eq!(out, b"returned NULL; h_errno = -1, Resolver internal error\n");

        let mut out = Vec::new();
        failure(&mut out, &HostError::Unknown(17).into()).unwrap();
        assert_eq!(out, b"returned NULL; h_errno = 17, Unknown resolver error\n");
    }

    #[test]
    fn host_is_echoed_literally() {
        let mut out = Vec::new();
        checking(&mut out, b"caf\xe9 %s").unwrap();
        assert_eq!(out, b"Checking gethostbyname(caf\xe9 %s)... ");
    }
}
