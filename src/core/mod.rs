// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Dialect-independent building blocks shared by the compiler passes.

pub mod dialect;
pub mod encoding;
pub mod error;
pub mod lexicon;
pub mod opcodes;
pub mod report;
pub mod vars;
