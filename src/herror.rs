//! Resolver error codes, as reported through `h_errno`

/// Why the resolver could not produce an address.
///
/// The numeric [`code()`][HostError::code] and the textual description (the [`Display`][std::fmt::Display]
/// implementation) are the same pair glibc's `hstrerror(3)` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error, displaydoc::Display)]
pub enum HostError {
    /// Resolver internal error
    Internal,
    /// Unknown host
    HostNotFound,
    /// Host name lookup failure
    TryAgain,
    /// Unknown server error
    NoRecovery,
    /// No address associated with name
    NoData,
    /// Unknown resolver error
    Unknown(i32),
}

impl HostError {
    /// The numeric `h_errno` value of this error.
    #[inline]
    pub fn code(self) -> i32 {
        match self {
            HostError::Internal => NETDB_INTERNAL,
            HostError::HostNotFound => HOST_NOT_FOUND,
            HostError::TryAgain => TRY_AGAIN,
            HostError::NoRecovery => NO_RECOVERY,
            HostError::NoData => NO_DATA,
            HostError::Unknown(code) => code,
        }
    }

    /// Interpret a numeric `h_errno` value.
    pub fn from_code(code: i32) -> Self {
        match code {
            NETDB_INTERNAL => HostError::Internal,
            HOST_NOT_FOUND => HostError::HostNotFound,
            TRY_AGAIN => HostError::TryAgain,
            NO_RECOVERY => HostError::NoRecovery,
            NO_DATA => HostError::NoData,
            code => HostError::Unknown(code),
        }
    }
}

// constants in `netdb.h`
const NETDB_INTERNAL: i32 = -1;
const HOST_NOT_FOUND: i32 = 1;
const TRY_AGAIN: i32 = 2;
const NO_RECOVERY: i32 = 3;
const NO_DATA: i32 = 4;
