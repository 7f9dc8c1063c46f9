//! Configuration taken from the environment

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable that selects the [`Backend`].
pub const RESOLVER_VAR: &str = "CHECK_HOSTNAME_RESOLVER";

/// Environment variable that overrides [`DEFAULT_NSCD_SOCKET`].
pub const NSCD_SOCKET_VAR: &str = "CHECK_HOSTNAME_NSCD_SOCKET";

/// The socket glibc's nscd listens on.
pub const DEFAULT_NSCD_SOCKET: &str = "/var/run/nscd/socket";

/// Which name-resolution facility answers the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// `getaddrinfo(3)`, i.e. whatever `/etc/nsswitch.conf` says
    #[default]
    System,
    /// Ask [nscd](https://man7.org/linux/man-pages/man8/nscd.8.html) directly
    Nscd,
}

impl Backend {
    /// The name used in [`RESOLVER_VAR`].
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::System => "system",
            Backend::Nscd => "nscd",
        }
    }
}

impl fmt::Display for Backend {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("system") {
            Ok(Backend::System)
        } else if s.eq_ignore_ascii_case("nscd") {
            Ok(Backend::Nscd)
        } else {
            Err(ConfigError::Backend(s.to_owned()))
        }
    }
}

/// Settings for [`resolve()`][crate::resolve].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The facility to query
    pub backend: Backend,
    /// Where to find nscd if [`Backend::Nscd`] is used
    pub nscd_socket: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            nscd_socket: PathBuf::from(DEFAULT_NSCD_SOCKET),
        }
    }
}

impl Config {
    /// Read [`RESOLVER_VAR`] and [`NSCD_SOCKET_VAR`] from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var_os(key))
    }

    /// Like [`Config::from_env()`], but variables are looked up using `var`.
    pub fn from_vars(mut var: impl FnMut(&str) -> Option<OsString>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(backend) = var(RESOLVER_VAR) {
            config.backend = backend.to_string_lossy().parse()?;
        }
        if let Some(path) = var(NSCD_SOCKET_VAR) {
            if path.is_empty() {
                return Err(ConfigError::EmptySocket);
            }
            config.nscd_socket = path.into();
        }
        log::trace!("configuration: {config:?}");
        Ok(config)
    }
}

/// An error returned by [`Config::from_env()`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub enum ConfigError {
    /// Unknown resolver {0:?} in CHECK_HOSTNAME_RESOLVER, expected "system" or "nscd"
    Backend(String),
    /// CHECK_HOSTNAME_NSCD_SOCKET must not be empty
    EmptySocket,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        Config::from_vars(|key| vars.get(key).map(OsString::from))
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.backend, Backend::System);
        assert_eq!(config.nscd_socket, PathBuf::from("/var/run/nscd/socket"));
    }

    #[test]
    fn backend_names() {
        let config = parse(&[(RESOLVER_VAR, "NSCD")]).unwrap();
        assert_eq!(config.backend, Backend::Nscd);
        let config = parse(&[(RESOLVER_VAR, " system\n")]).unwrap();
        assert_eq!(config.backend, Backend::System);

        let err = parse(&[(RESOLVER_VAR, "dnsmasq")]).unwrap_err();
        assert_eq!(err, ConfigError::Backend("dnsmasq".to_owned()));
        assert_eq!(
            err.to_string(),
            r#"Unknown resolver "dnsmasq" in CHECK_HOSTNAME_RESOLVER, expected "system" or "nscd""#,
        );
    }

    #[test]
    fn nscd_socket() {
        let config = parse(&[(RESOLVER_VAR, "nscd"), (NSCD_SOCKET_VAR, "/tmp/nscd.sock")]).unwrap();
        assert_eq!(config.nscd_socket, PathBuf::from("/tmp/nscd.sock"));

        let err = parse(&[(NSCD_SOCKET_VAR, "")]).unwrap_err();
        assert_eq!(err, ConfigError::EmptySocket);
        assert_eq!(err.to_string(), "CHECK_HOSTNAME_NSCD_SOCKET must not be empty");
    }

    #[test]
    fn display_roundtrips() {
        for backend in [Backend::System, Backend::Nscd] {
            assert_eq!(backend.to_string().parse::<Backend>().unwrap(), backend);
        }
    }
}
