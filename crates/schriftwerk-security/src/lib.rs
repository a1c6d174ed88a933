// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// schriftwerk-security — the gate every path and every piece of text passes
// through, and the append-only trail of what happened at that gate.
//
// `PolicyValidator` decides; `AuditLog` remembers. Neither ever panics on
// bad input, and neither ever surfaces an OS error string to the user.

pub mod audit;
pub mod policy;

pub use audit::{AuditLog, AuditRecord, basename};
pub use policy::{PolicyValidator, sanitize_filename, validate_text_with_limit};
