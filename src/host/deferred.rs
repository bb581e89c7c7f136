//! Deferred completions and the promises they settle.
//!
//! A `Deferred` is consumed by `resolve` or `reject`, so a second terminal
//! action cannot be expressed. Dropping one unsettled rejects its promise
//! with the unknown-error sentinel.

use super::{HostError, HostValue};
use crate::error::UNKNOWN_ERROR;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    Pending,
    Fulfilled(HostValue),
    Rejected(HostError),
}

type Shared = Rc<RefCell<PromiseState>>;

/// Caller-facing half: observes the outcome.
#[derive(Debug, Clone)]
pub struct Promise {
    state: Shared,
}

/// Completer-facing half: settles the promise exactly once.
#[derive(Debug)]
pub struct Deferred {
    state: Option<Shared>,
}

/// Create a deferred completion pair.
pub fn create_promise() -> (Deferred, Promise) {
    let state = Rc::new(RefCell::new(PromiseState::Pending));
    (
        Deferred {
            state: Some(state.clone()),
        },
        Promise { state },
    )
}

impl Promise {
    pub fn state(&self) -> PromiseState {
        self.state.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.state.borrow(), PromiseState::Pending)
    }

    /// Settled outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<Result<HostValue, HostError>> {
        match &*self.state.borrow() {
            PromiseState::Pending => None,
            PromiseState::Fulfilled(value) => Some(Ok(value.clone())),
            PromiseState::Rejected(error) => Some(Err(error.clone())),
        }
    }
}

impl Deferred {
    pub fn resolve(mut self, value: HostValue) {
        self.settle(PromiseState::Fulfilled(value));
    }

    pub fn reject(mut self, error: HostError) {
        self.settle(PromiseState::Rejected(error));
    }

    fn settle(&mut self, outcome: PromiseState) {
        if let Some(state) = self.state.take() {
            *state.borrow_mut() = outcome;
        }
    }
}

impl Drop for Deferred {
    fn drop(&mut self) {
        if self.state.is_some() {
            log::warn!("[HOST] Deferred dropped without settling; rejecting");
            self.settle(PromiseState::Rejected(HostError::error(UNKNOWN_ERROR)));
        }
    }
}
