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

//! Source identity for compilation units
//!
//! A [`Source`] is an opaque, equality-comparable handle to one unit of
//! input. Equality and hashing consider only the path, so two handles to the
//! same file always compare equal and the scheduler never registers a second
//! job for a file it already knows about.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A handle to a unit of compiler input.
#[derive(Debug, Clone)]
pub struct Source {
    /// Path identifying the input. For synthetic sources this is just the
    /// given name.
    path: PathBuf,
    /// Modification time at the point the source was opened, if available.
    modified: Option<SystemTime>,
    /// True if the user named this source explicitly (e.g. on a command
    /// line) rather than it being pulled in by a cross-file reference.
    user_specified: bool,
}

impl Source {
    /// Open a file-backed source, capturing its modification time.
    pub fn file(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let modified = std::fs::metadata(&path)?.modified().ok();
        Ok(Self {
            path,
            modified,
            user_specified: false,
        })
    }

    /// Create a synthetic in-memory source with the given name.
    ///
    /// Used by tests and by extensions that fabricate compilation units
    /// (e.g. generated code) with no backing file.
    pub fn synthetic(name: impl Into<PathBuf>) -> Self {
        Self {
            path: name.into(),
            modified: None,
            user_specified: false,
        }
    }

    /// Mark this source as explicitly requested by the user.
    pub fn user_specified(mut self) -> Self {
        self.user_specified = true;
        self
    }

    /// Whether this source was explicitly requested by the user.
    pub fn is_user_specified(&self) -> bool {
        self.user_specified
    }

    /// The path identifying this source.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time captured when the source was opened, if any.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Stable display name (the final path component, or the full path if
    /// there is none).
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Source {}

impl Hash for Source {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
