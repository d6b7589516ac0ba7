//! reloop: reducers return a new state plus a [`Cmd`] describing the effects
//! to run once that state is committed. The runtime executes the command and
//! feeds the actions it produces back through the same reducer.
//!
//! Everything lives in `reloop-core`; this crate re-exports it together with
//! the `CombineReducers` derive.

pub use reloop_core::*;
pub use reloop_core_macros::CombineReducers;
