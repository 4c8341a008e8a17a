//! Sharing state between async tasks.
//!
//! Account sources and chain state readers are driven by a multi threaded
//! runtime natively and by the browser's single threaded executor on
//! `wasm32-unknown-unknown`, where their bindings are not `Send`.
//! [`SharedSource`] is the bound those traits carry so one definition
//! serves both targets.

use std::sync::PoisonError;

/// Bound of an async data source: `Send + Sync` natively, nothing on wasm.
#[cfg(not(target_arch = "wasm32"))]
pub trait SharedSource: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> SharedSource for T {}

/// Bound of an async data source: `Send + Sync` natively, nothing on wasm.
#[cfg(target_arch = "wasm32")]
pub trait SharedSource {}

#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> SharedSource for T {}

/// Shared interior mutability cell backed by a read-write lock.
///
/// A poisoned lock is recovered rather than propagated: every writer in this
/// workspace replaces whole values, so a panic mid-write cannot leave a
/// partially updated value behind.
///
/// # Example
/// ```
/// use mandate_common::SharedCell;
///
/// let cell = SharedCell::new(42);
/// assert_eq!(*cell.read(), 42);
///
/// *cell.write() = 100;
/// assert_eq!(*cell.read(), 100);
/// ```
#[derive(Debug, Default)]
pub struct SharedCell<T>(std::sync::RwLock<T>);

impl<T> SharedCell<T> {
    /// Creates a new SharedCell with the given value
    pub fn new(value: T) -> Self {
        Self(std::sync::RwLock::new(value))
    }

    /// Acquires a read lock, blocking until it can be acquired
    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires a write lock, blocking until it can be acquired
    pub fn write(&self) -> std::sync::RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with exclusive access and returns its result.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.write())
    }
}
