//! Resolve host names using the C library's `getaddrinfo(3)`

use std::net::{Ipv4Addr, SocketAddr};

use dns_lookup::{AddrFamily, AddrInfoHints, LookupErrorKind, SockType, getaddrinfo};

use crate::herror::HostError;
use crate::resolve::ResolutionError;

pub(crate) fn lookup(host: &[u8]) -> Result<Vec<Ipv4Addr>, ResolutionError> {
    let host = std::str::from_utf8(host)
        .map_err(|err| ResolutionError::new(HostError::HostNotFound, err))?;

    // one entry per address: ask for a single socket type, and only for IPv4
    let hints = AddrInfoHints {
        socktype: SockType::Stream.into(),
        address: AddrFamily::Inet.into(),
        ..AddrInfoHints::default()
    };
    let entries = getaddrinfo(Some(host), None, Some(hints)).map_err(|err| {
        let kind = host_error(err.kind(), err.error_num());
        let err = AddrInfoError {
            code: err.error_num(),
            message: std::io::Error::from(err).to_string(),
        };
        log::debug!("getaddrinfo({host:?}) failed: {err}");
        ResolutionError::new(kind, err)
    })?;

    let mut addrs = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => match entry.sockaddr {
                SocketAddr::V4(addr) => addrs.push(*addr.ip()),
                SocketAddr::V6(addr) => log::trace!("skipping IPv6 address {}", addr.ip()),
            },
            Err(err) => log::debug!("skipping unusable getaddrinfo entry: {err:?}"),
        }
    }
    Ok(addrs)
}

/// The `h_errno` value `gethostbyname(3)` reports for a `getaddrinfo(3)` failure.
fn host_error(kind: LookupErrorKind, code: i32) -> HostError {
    // IPv6 literals and IPv6-only names, there is no `LookupErrorKind` for `EAI_ADDRFAMILY`
    if code == EAI_ADDRFAMILY {
        return HostError::HostNotFound;
    }
    match kind {
        LookupErrorKind::NoName | LookupErrorKind::Family => HostError::HostNotFound,
        LookupErrorKind::Again => HostError::TryAgain,
        LookupErrorKind::Fail => HostError::NoRecovery,
        LookupErrorKind::NoData => HostError::NoData,
        _ => HostError::Internal,
    }
}

// constant in glibc's `netdb.h`
const EAI_ADDRFAMILY: i32 = -9;

/// getaddrinfo failed with code {code}: {message}
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub struct AddrInfoError {
    /// The `EAI_*` value
    pub code: i32,
    /// What `gai_strerror(3)` says about `code`
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost() {
        let addrs = lookup(b"localhost").unwrap();
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(Ipv4Addr::is_loopback), "{addrs:?}");
    }

    #[test]
    fn numeric_address() {
        assert_eq!(lookup(b"192.0.2.33").unwrap(), [Ipv4Addr::new(192, 0, 2, 33)]);
    }

    #[test]
    fn reserved_tld() {
        // `.invalid` never resolves, but without network access the exact error varies
        let err = lookup(b"this-host-does-not-exist.invalid").unwrap_err();
        assert!(matches!(err.cause(), Some(crate::Cause::AddrInfo(_))), "{err:?}");
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn ipv6_literal() {
        let err = lookup(b"::1").unwrap_err();
        assert_eq!(err.kind(), HostError::HostNotFound);
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn not_utf8() {
        let err = lookup(b"caf\xe9.test").unwrap_err();
        assert_eq!(err.kind(), HostError::HostNotFound);
        assert!(matches!(err.cause(), Some(crate::Cause::Utf8(_))));
    }

    #[test]
    fn error_mapping() {
        assert_eq!(host_error(LookupErrorKind::NoName, -2), HostError::HostNotFound);
        assert_eq!(host_error(LookupErrorKind::Again, -3), HostError::TryAgain);
        assert_eq!(host_error(LookupErrorKind::Fail, -4), HostError::NoRecovery);
        assert_eq!(host_error(LookupErrorKind::NoData, -5), HostError::NoData);
        assert_eq!(host_error(LookupErrorKind::Memory, -10), HostError::Internal);
        assert_eq!(host_error(LookupErrorKind::System, -11), HostError::Internal);
        assert_eq!(host_error(LookupErrorKind::Family, -6), HostError::HostNotFound);
        assert_eq!(host_error(LookupErrorKind::System, EAI_ADDRFAMILY), HostError::HostNotFound);
    }
}
