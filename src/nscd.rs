//! Resolve host names by asking nscd directly
//!
//! A `GETAI` request is written to nscd's UNIX socket and the response is read back blockingly.
//! There is no timeout, interrupted system calls are restarted.

use std::ffi::CStr;
use std::io::{IoSlice, IoSliceMut};
use std::iter::FusedIterator;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::Path;

use bytemuck::checked::try_cast_slice;
use bytemuck::{CheckedBitPattern, Pod, Zeroable, bytes_of, bytes_of_mut};
use rustix::io::{Errno, readv, writev};
use rustix::net::{
    AddressFamily, SocketAddrUnix, SocketFlags, SocketType, socket_with,
};

use crate::herror::HostError;
use crate::resolve::ResolutionError;

pub(crate) fn lookup(socket: &Path, host: &[u8]) -> Result<Vec<Ipv4Addr>, ResolutionError> {
    match query(socket, host) {
        Ok(Answer::Found(addrs)) => Ok(addrs),
        Ok(Answer::NotFound(kind)) => {
            log::debug!("nscd has no entry: {kind}");
            Err(kind.into())
        }
        Err(err) => {
            log::debug!("could not query nscd at {}: {err}", socket.display());
            Err(ResolutionError::new(HostError::Internal, err))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer {
    Found(Vec<Ipv4Addr>),
    NotFound(HostError),
}

fn query(socket: &Path, host: &[u8]) -> Result<Answer, Error> {
    let sock = connect(socket)?;
    write_request(sock.as_fd(), host)?;

    let mut resp = AiResponseHeader::default();
    let data_len = match read_header(sock.as_fd(), &mut resp)? {
        Header::Negative(kind) => return Ok(Answer::NotFound(kind)),
        Header::HasData(data_len) => data_len,
    };

    let mut buf = vec![0; data_len];
    read_data(sock.as_fd(), &mut buf)?;

    let entries = interpret_data(&resp, &buf)?;
    if let Some(canon) = entries.canon() {
        log::debug!("canonical name: {canon:?}");
    }
    let addrs = entries
        .filter_map(|addr| match addr {
            IpAddr::V4(addr) => Some(addr),
            IpAddr::V6(addr) => {
                log::trace!("skipping IPv6 address {addr}");
                None
            }
        })
        .collect::<Vec<_>>();
    if addrs.is_empty() {
        return Ok(Answer::NotFound(HostError::NoData));
    }
    Ok(Answer::Found(addrs))
}

/// An error that occurred while talking to nscd
#[derive(Debug, Clone, Copy, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// Could not use socket
    Socket(#[from] SocketError),
    /// Could not send request
    Request(#[from] RequestError),
    /// Could not receive response header
    Header(#[from] HeaderError),
    /// Could not receive response data
    Data(#[from] DataError),
}

fn connect(path: &Path) -> Result<OwnedFd, SocketError> {
    let addr = SocketAddrUnix::new(path).map_err(|_| SocketError::Addr)?;
    let sock = socket_with(
        AddressFamily::UNIX,
        SocketType::STREAM,
        SocketFlags::CLOEXEC,
        None,
    )
    .map_err(SocketError::Open)?;
    rustix::net::connect(&sock, &addr).map_err(SocketError::Connect)?;
    Ok(sock)
}

/// nscd socket could not be used
#[derive(Debug, Clone, Copy, thiserror::Error, displaydoc::Display)]
pub enum SocketError {
    /// Could not open socket
    Open(#[source] Errno),
    /// Nscd socket address was invalid
    Addr,
    /// Could not connect to nscd socket
    Connect(#[source] Errno),
}

fn write_request(sock: BorrowedFd<'_>, host: &[u8]) -> Result<(), RequestError> {
    // the key is sent NUL terminated
    let key_len = host
        .len()
        .checked_add(1)
        .and_then(|len| i32::try_from(len).ok())
        .ok_or(RequestError::TooLong)?;
    let req = RequestHeader {
        version: NSCD_VERSION,
        r#type: GETAI,
        key_len,
    };

    let mut slices = [
        IoSlice::new(bytes_of(&req)),
        IoSlice::new(host),
        IoSlice::new(b"\0"),
    ];
    write_all(sock, &mut slices).map_err(RequestError::Write)
}

/// nscd request could not be sent
#[derive(Debug, Clone, Copy, thiserror::Error, displaydoc::Display)]
pub enum RequestError {
    /// Could not send request
    Write(#[source] WriteError),
    /// Host name is too long
    TooLong,
}

fn read_header(sock: BorrowedFd<'_>, resp: &mut AiResponseHeader) -> Result<Header, HeaderError> {
    read_all(sock, &mut [IoSliceMut::new(bytes_of_mut(resp))])?;
    check_header(resp)
}

fn check_header(resp: &AiResponseHeader) -> Result<Header, HeaderError> {
    if resp.version != NSCD_VERSION {
        return Err(HeaderError::Version(resp.version));
    } else if resp.found < 0 {
        // the database is not cached, nscd is effectively unavailable
        return Ok(Header::Negative(HostError::Internal));
    } else if resp.found != 1 {
        return Ok(Header::Negative(match resp.error {
            0 => HostError::HostNotFound,
            code => HostError::from_code(code),
        }));
    } else if resp.error != 0 {
        return Ok(Header::Negative(HostError::from_code(resp.error)));
    } else if resp.naddrs == 0 || resp.addrslen == 0 {
        return Ok(Header::Negative(HostError::NoData));
    } else if resp.naddrs < 0 || resp.addrslen < 0 || resp.canonlen < 0 || resp.canonlen > 254 {
        return Err(HeaderError::Data);
    }

    let Some(data_len) = Some(resp.naddrs)
        .and_then(|l| l.checked_add(resp.addrslen))
        .and_then(|l| l.checked_add(resp.canonlen))
    else {
        return Err(HeaderError::TooBig);
    };
    let data_len = data_len as u32 as usize;
    if data_len > MAX_DATA_LEN {
        return Err(HeaderError::TooBig);
    }

    Ok(Header::HasData(data_len))
}

/// nscd response header could not be used
#[derive(Debug, Clone, Copy, thiserror::Error, displaydoc::Display)]
pub enum HeaderError {
    /// Could not read header
    Read(#[from] ReadError),
    /// Wrong version {0:x}, expected {NSCD_VERSION:x}
    Version(i32),
    /// nscd response not understood
    Data,
    /// nscd response unreasonable large
    TooBig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    Negative(HostError),
    HasData(usize),
}

fn read_data(sock: BorrowedFd<'_>, buf: &mut [u8]) -> Result<(), DataError> {
    Ok(read_all(sock, &mut [IoSliceMut::new(buf)])?)
}

// The payload is laid out as `addresses ++ families ++ canonical name`.
fn interpret_data<'a>(resp: &AiResponseHeader, slice: &'a [u8]) -> Result<Entries<'a>, DataError> {
    let (slice, canon) = if resp.canonlen != 0 {
        match slice
            .len()
            .checked_sub(resp.canonlen.try_into().unwrap_or(usize::MAX))
            .and_then(|at| slice.split_at_checked(at))
            .and_then(|(slice, canon)| Some((slice, CStr::from_bytes_with_nul(canon).ok()?)))
        {
            Some((slice, canon)) => (slice, Some(canon)),
            None => return Err(DataError::Canon),
        }
    } else {
        (slice, None)
    };

    // every family byte has to be `AF_INET` or `AF_INET6`
    let Some((slice, families)) = slice
        .len()
        .checked_sub(resp.naddrs.try_into().unwrap_or(usize::MAX))
        .and_then(|at| slice.split_at_checked(at))
        .and_then(|(slice, families)| Some((slice, try_cast_slice(families).ok()?)))
    else {
        return Err(DataError::Family);
    };

    let expected_len: usize = families
        .iter()
        .map(|&family| match family {
            Family::V4 => size_of::<Ipv4Addr>(),
            Family::V6 => size_of::<Ipv6Addr>(),
        })
        .sum();
    if expected_len != slice.len() {
        return Err(DataError::DataLength {
            actual: slice.len(),
            expected: expected_len,
        });
    }

    Ok(Entries {
        families,
        slice,
        canon,
    })
}

/// nscd response data could not be used
#[derive(Debug, Clone, Copy, thiserror::Error, displaydoc::Display)]
pub enum DataError {
    /// Could not read response data
    Read(#[from] ReadError),
    /// Could not extract canonical name
    Canon,
    /// Response contained address families other than AF_INET / AF_INET6
    Family,
    /// Actual length of IP addresses {actual} != expected length {expected}
    DataLength {
        /// bytes received
        actual: usize,
        /// bytes announced by the address families
        expected: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Entries<'a> {
    families: &'a [Family],
    slice: &'a [u8],
    canon: Option<&'a CStr>,
}

impl<'a> Entries<'a> {
    fn canon(&self) -> Option<&'a CStr> {
        self.canon
    }
}

impl Iterator for Entries<'_> {
    type Item = IpAddr;

    fn next(&mut self) -> Option<Self::Item> {
        let [family, families @ ..] = self.families else {
            return None;
        };
        self.families = families;

        match family {
            Family::V4 => {
                let (bits, slice) = self.slice.split_first_chunk::<4>()?;
                self.slice = slice;
                Some(IpAddr::V4(Ipv4Addr::from(*bits)))
            }
            Family::V6 => {
                let (bits, slice) = self.slice.split_first_chunk::<16>()?;
                self.slice = slice;
                Some(IpAddr::V6(Ipv6Addr::from(*bits)))
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.families.len()))
    }
}

impl FusedIterator for Entries<'_> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, CheckedBitPattern)]
#[repr(u8)]
#[allow(dead_code)] // constructed by [`try_cast_slice()`]
enum Family {
    V4 = 2,
    V6 = 10,
}

fn write_all(sock: BorrowedFd<'_>, mut slices: &mut [IoSlice<'_>]) -> Result<(), WriteError> {
    while !slices.is_empty() {
        match writev(sock, slices) {
            Ok(0) => return Err(WriteError(None)),
            Ok(n) => IoSlice::advance_slices(&mut slices, n),
            Err(Errno::INTR) => continue,
            Err(err) => return Err(WriteError(Some(err))),
        }
    }
    Ok(())
}

/// Could not write data to socket
#[derive(Debug, Clone, Copy, thiserror::Error, displaydoc::Display)]
pub struct WriteError(#[source] pub Option<Errno>);

fn read_all(sock: BorrowedFd<'_>, mut slices: &mut [IoSliceMut<'_>]) -> Result<(), ReadError> {
    while !slices.is_empty() {
        match readv(sock, slices) {
            Ok(0) => return Err(ReadError(None)),
            Ok(n) => IoSliceMut::advance_slices(&mut slices, n),
            Err(Errno::INTR) => continue,
            Err(err) => return Err(ReadError(Some(err))),
        }
    }
    Ok(())
}

/// Could not read data from socket
#[derive(Debug, Clone, Copy, thiserror::Error, displaydoc::Display)]
pub struct ReadError(#[source] pub Option<Errno>);

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct RequestHeader {
    version: i32,
    r#type: i32,
    key_len: i32,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable, Default)]
#[repr(C)]
struct AiResponseHeader {
    version: i32,
    found: i32,
    naddrs: NscdSsize,
    addrslen: NscdSsize,
    canonlen: NscdSsize,
    error: i32,
}

// typedef in `nscd-types.h`
type NscdSsize = i32;

// constants in `nscd-client.h`
const GETAI: i32 = 14;
const NSCD_VERSION: i32 = 2;

const MAX_DATA_LEN: usize = 8192; // not an nscd limit, only a sanity check
