//! List and detail controllers.
//!
//! Each controller is a pure state machine: [`StateMachine::handle`] applies
//! one event to the in-memory state and returns the storage effects it
//! wants performed. A driver owns the machine and a service, executes the
//! effects in order and feeds each effect's terminal result back in as an
//! event, one at a time.
//!
//! Mutations are optimistic: the in-memory list changes before the write is
//! confirmed. When a write fails the machine records the message in
//! `persist_error` and reloads from storage, so memory converges on what was
//! actually persisted.

mod medical_history;
mod patient_list;

pub use medical_history::*;
pub use patient_list::*;

use std::collections::VecDeque;

/// A synchronous transition function over explicit events and effects.
pub trait StateMachine {
    type Event;
    type Effect;

    /// Apply `event`. Events the current state does not accept are ignored
    /// and produce no effects.
    fn handle(&mut self, event: Self::Event) -> Vec<Self::Effect>;
}

/// Feed `event` through `machine`, running effects until none remain.
///
/// `run` executes one effect and returns the event describing its outcome,
/// if the machine needs to hear about it.
pub(crate) fn drive<M, F>(machine: &mut M, event: M::Event, mut run: F)
where
    M: StateMachine,
    F: FnMut(M::Effect) -> Option<M::Event>,
{
    let mut pending = VecDeque::from([event]);
    while let Some(event) = pending.pop_front() {
        for effect in machine.handle(event) {
            pending.extend(run(effect));
        }
    }
}

/// Render an error chain into the single-line message kept on a context.
pub(crate) fn error_message(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
