//! Synchronous-completion interlock
//!
//! A transport may run a completion before the call that issued the request
//! returns. If that completion issued the next request itself, every byte
//! already buffered would add a stack frame. The interlock turns that into a
//! loop in the issuer instead:
//!
//! 1. the issuer calls [`IssueInterlock::begin`] and issues the request;
//! 2. a completion that finds the marker still `Starting` flips it to
//!    `Immediate` through [`IssueInterlock::complete_inline`] and returns;
//! 3. once the issuing call returns, [`IssueInterlock::end`] exchanges the
//!    marker to `Ended`. Seeing `Immediate` there means the completion
//!    already ran and the issuer loops; otherwise the request is pending and
//!    its completion will issue the next one from its own frame.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IssueState {
    Starting = 0,
    Ended = 1,
    Immediate = 2,
}

impl IssueState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => IssueState::Starting,
            2 => IssueState::Immediate,
            _ => IssueState::Ended,
        }
    }
}

#[derive(Debug)]
pub struct IssueInterlock {
    state: AtomicU8,
}

impl Default for IssueInterlock {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueInterlock {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(IssueState::Ended as u8),
        }
    }

    pub fn state(&self) -> IssueState {
        IssueState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Marks a request as being issued.
    pub fn begin(&self) {
        self.state.store(IssueState::Starting as u8, Ordering::Release);
    }

    /// Called by the issuer after the issuing call returned.
    ///
    /// Returns `true` when the completion already ran and the issuer must
    /// issue the next request itself.
    pub fn end(&self) -> bool {
        let previous = self.state.swap(IssueState::Ended as u8, Ordering::AcqRel);
        IssueState::from_u8(previous) == IssueState::Immediate
    }

    /// Called by the completion.
    ///
    /// Returns `true` when the issuer is still inside the issuing call and
    /// will pick up the next request; the completion must then return
    /// without issuing.
    pub fn complete_inline(&self) -> bool {
        self.state
            .compare_exchange(
                IssueState::Starting as u8,
                IssueState::Immediate as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}
