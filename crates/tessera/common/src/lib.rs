// Tessera
// Copyright (C) 2025 Tessera Project

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Shared leaf types for the Tessera compiler framework: source identity,
//! source positions, and diagnostic accumulation.
//!
//! Everything here is consumed by the frontend scheduler through narrow
//! interfaces; nothing in this crate knows about goals, jobs, or passes.

pub mod diagnostics;
pub mod position;
pub mod source;

pub use diagnostics::{Diagnostic, ErrorSink, Severity};
pub use position::Position;
pub use source::Source;
