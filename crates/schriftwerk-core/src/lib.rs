// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Schriftwerk — Core types, ports, and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod ports;
pub mod types;

pub use config::{AppConfig, PolicyConfig};
pub use error::SchriftwerkError;
pub use types::*;
