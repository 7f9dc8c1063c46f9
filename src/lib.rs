// SPDX-FileCopyrightText: 2025 René Kijewski <crates.io@k6i.de>
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// only used by the binary
use env_logger as _;

pub mod config;
mod herror;
pub mod nscd;
pub mod report;
mod resolve;
pub mod system;

pub use crate::config::{Backend, Config, ConfigError};
pub use crate::herror::HostError;
pub use crate::resolve::{
    Addresses, AddressesIter, Cause, ResolutionError, resolve, resolve_first_address,
};
