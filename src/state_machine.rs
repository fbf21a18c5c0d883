//! Turn state machine
//!
//! Elm-style: `transition` is pure and returns the next state plus the
//! collaborator call to make. The runtime executes effects and feeds their
//! results back in as events.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use transition::{transition, TransitionError};
