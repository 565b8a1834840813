//! Execution context token
//!
//! Blocking calls take a `&TaskContext`. Only thread-mode code can obtain
//! one, and the token is neither `Send` nor `Sync`, so it cannot be parked in
//! a static for an interrupt handler to pick up.

use core::marker::PhantomData;

/// Proof that the caller runs in task (thread-mode) context
#[derive(Debug)]
pub struct TaskContext {
    _not_send: PhantomData<*const ()>,
}

impl TaskContext {
    /// Create a token without checking the execution context
    ///
    /// # Safety
    ///
    /// The caller must not be running inside an interrupt handler. The
    /// firmware wraps this behind a check of the active exception number.
    #[allow(unsafe_code)]
    pub const unsafe fn new_unchecked() -> Self {
        Self {
            _not_send: PhantomData,
        }
    }

    #[cfg(test)]
    #[allow(unsafe_code)]
    pub(crate) fn for_test() -> Self {
        // SAFETY: host tests run on a plain thread
        unsafe { Self::new_unchecked() }
    }
}
