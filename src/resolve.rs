//! Host name resolution

use std::iter::FusedIterator;
use std::net::Ipv4Addr;
use std::str::Utf8Error;

use crate::config::{Backend, Config};
use crate::herror::HostError;
use crate::{nscd, system};

/// Resolve `host` and return the first address the resolver answered with.
///
/// This is a single, blocking query without a timeout. The order of the addresses is the
/// resolver's order, so the result might differ between calls.
#[inline]
pub fn resolve_first_address(
    host: impl AsRef<[u8]>,
    config: &Config,
) -> Result<Ipv4Addr, ResolutionError> {
    Ok(resolve(host, config)?.first())
}

/// Resolve `host` and return all IPv4 addresses the resolver answered with.
///
/// See [`resolve_first_address()`].
#[inline]
pub fn resolve(host: impl AsRef<[u8]>, config: &Config) -> Result<Addresses, ResolutionError> {
    do_resolve(host.as_ref(), config)
}

fn do_resolve(host: &[u8], config: &Config) -> Result<Addresses, ResolutionError> {
    if host.contains(&0) {
        return Err(ResolutionError::new(HostError::HostNotFound, Cause::Nul));
    }

    log::debug!(
        "resolving {:?} using the {} resolver",
        String::from_utf8_lossy(host),
        config.backend,
    );
    let addrs = match config.backend {
        Backend::System => system::lookup(host)?,
        Backend::Nscd => nscd::lookup(&config.nscd_socket, host)?,
    };
    log::debug!("resolver answered with {} IPv4 address(es)", addrs.len());

    Addresses::new(addrs).ok_or_else(|| HostError::NoData.into())
}

/// A non-empty list of resolved addresses, in the resolver's order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Addresses {
    first: Ipv4Addr,
    rest: Vec<Ipv4Addr>,
}

impl Addresses {
    /// Returns `None` if `addrs` is empty.
    pub fn new(addrs: Vec<Ipv4Addr>) -> Option<Self> {
        let mut addrs = addrs.into_iter();
        let first = addrs.next()?;
        Some(Self {
            first,
            rest: addrs.collect(),
        })
    }

    /// The first address.
    #[inline]
    pub fn first(&self) -> Ipv4Addr {
        self.first
    }

    /// Number of addresses, at least 1.
    #[inline]
    #[allow(clippy::len_without_is_empty)] // never empty
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    /// Iterate over all addresses.
    #[inline]
    pub fn iter(&self) -> AddressesIter<'_> {
        AddressesIter {
            first: Some(self.first),
            rest: self.rest.iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Addresses {
    type Item = Ipv4Addr;
    type IntoIter = AddressesIter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over [`Addresses`].
#[derive(Debug, Clone)]
pub struct AddressesIter<'a> {
    first: Option<Ipv4Addr>,
    rest: std::slice::Iter<'a, Ipv4Addr>,
}

impl Iterator for AddressesIter<'_> {
    type Item = Ipv4Addr;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self.first.take() {
            Some(addr) => Some(addr),
            None => self.rest.next().copied(),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}

impl FusedIterator for AddressesIter<'_> {}

impl ExactSizeIterator for AddressesIter<'_> {
    #[inline]
    fn len(&self) -> usize {
        usize::from(self.first.is_some()) + self.rest.len()
    }
}

/// An error returned by [`resolve()`]
///
/// The error bundles the `h_errno` [`kind`][Self::kind] with the low-level [`cause`][Self::cause],
/// if there is one.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct ResolutionError {
    kind: HostError,
    #[source]
    cause: Option<Cause>,
}

impl ResolutionError {
    pub(crate) fn new(kind: HostError, cause: impl Into<Cause>) -> Self {
        Self {
            kind,
            cause: Some(cause.into()),
        }
    }

    /// What went wrong, in terms of `h_errno`.
    #[inline]
    pub fn kind(&self) -> HostError {
        self.kind
    }

    /// The numeric `h_errno` value.
    #[inline]
    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    /// The underlying error, if the resolver could not be queried properly.
    #[inline]
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl From<HostError> for ResolutionError {
    #[inline]
    fn from(kind: HostError) -> Self {
        Self { kind, cause: None }
    }
}

/// The underlying error of a [`ResolutionError`]
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Cause {
    /// Could not query nscd
    Nscd(#[from] nscd::Error),
    /// Could not query getaddrinfo
    AddrInfo(#[from] system::AddrInfoError),
    /// Host name is not valid UTF-8
    Utf8(#[from] Utf8Error),
    /// Host name contains a NUL byte
    Nul,
}
