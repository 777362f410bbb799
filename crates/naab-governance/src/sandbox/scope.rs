//! Thread-local "current sandbox" with RAII activation.
//!
//! ```ignore
//! let _guard = ScopedSandbox::activate(Sandbox::new(config));
//! assert!(ScopedSandbox::current().is_some());
//! // previous sandbox restored when `_guard` drops
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use super::engine::Sandbox;

thread_local! {
    static CURRENT: RefCell<Option<Rc<Sandbox>>> = const { RefCell::new(None) };
}

/// Activates a sandbox on this thread until dropped, then restores the
/// one that was active before. Guards nest and cannot leave their thread.
#[must_use = "the sandbox is deactivated when the guard drops"]
pub struct ScopedSandbox {
    previous: Option<Rc<Sandbox>>,
}

impl ScopedSandbox {
    pub fn activate(sandbox: Sandbox) -> Self {
        let previous = CURRENT.with(|c| c.replace(Some(Rc::new(sandbox))));
        Self { previous }
    }

    /// The innermost active sandbox on this thread.
    pub fn current() -> Option<Rc<Sandbox>> {
        CURRENT.with(|c| c.borrow().clone())
    }

    /// Run `f` against the current sandbox, or return `None` if none is active.
    pub fn with_current<R>(f: impl FnOnce(&Sandbox) -> R) -> Option<R> {
        Self::current().map(|sb| f(&sb))
    }
}

impl Drop for ScopedSandbox {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|c| {
            c.replace(previous);
        });
    }
}
