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

//! Lazy cross-file references
//!
//! A [`LazyRef`] is a deferred value populated by a completed lookup goal.
//! Dereferencing one before its resolver goal has succeeded is a programming
//! error and panics; it is never a normal compilation failure. The cell is a
//! plain `Rc<RefCell<..>>` because the whole scheduling model is
//! single-threaded.

use std::cell::RefCell;
use std::rc::Rc;

enum LazyState<T> {
    /// Resolver goal has not run yet; the string describes what is expected.
    Pending(String),
    Known(T),
    /// Poisoned cell standing in for a value that can never resolve; both
    /// reads and writes panic with the message.
    Error(String),
}

/// A shared deferred value resolved by a lookup goal.
pub struct LazyRef<T> {
    inner: Rc<RefCell<LazyState<T>>>,
}

impl<T> LazyRef<T> {
    /// Create an unresolved reference. The description names what the
    /// resolver is expected to supply (used in the panic message if the cell
    /// is dereferenced early).
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LazyState::Pending(description.into()))),
        }
    }

    /// Create a poisoned reference that panics on any access.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LazyState::Error(message.into()))),
        }
    }

    /// Resolve the cell. Called by the resolver goal's task body.
    pub fn update(&self, value: T) {
        let mut state = self.inner.borrow_mut();
        match &*state {
            LazyState::Error(msg) => panic!("cannot update reference: {}", msg),
            _ => *state = LazyState::Known(value),
        }
    }

    /// True once the resolver goal has populated the cell.
    pub fn known(&self) -> bool {
        matches!(&*self.inner.borrow(), LazyState::Known(_))
    }

    /// Read the value through a closure without cloning.
    ///
    /// Panics if the cell is unresolved: the resolver goal must have
    /// succeeded before anyone dereferences the reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        match &*self.inner.borrow() {
            LazyState::Known(value) => f(value),
            LazyState::Pending(desc) => panic!("dereferenced unresolved lazy reference: {}", desc),
            LazyState::Error(msg) => panic!("{}", msg),
        }
    }
}

impl<T: Clone> LazyRef<T> {
    /// Clone the resolved value out of the cell.
    ///
    /// Panics if the cell is unresolved, like [`with`](Self::with).
    pub fn get(&self) -> T {
        self.with(|v| v.clone())
    }
}

impl<T> Clone for LazyRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}
