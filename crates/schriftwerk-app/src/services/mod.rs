// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — builds the shared collaborators once and hands out use
// cases wired to them.

pub mod app_services;
pub mod data_dir;
