use std::time::SystemTime;

use crate::{Cmd, Error, Failure};

/// Observation variants emitted by the store runtime and the effect runner.
///
/// Carries the action type directly so observers can pattern-match without
/// stringification. No trait bounds are imposed here; helpers add whatever
/// bounds they need.
pub enum Observation<A> {
    /// An action is about to be reduced.
    Action { ts: SystemTime, data: A },
    /// A command returned by the reducer is being started.
    Effect { ts: SystemTime, data: Cmd<A> },
    /// A run function failed. `handled` is set when a fail-action constructor
    /// turned the failure into an action.
    Failure {
        ts: SystemTime,
        func: &'static str,
        reason: Failure,
        handled: bool,
    },
    /// A command could not be started because it is misconfigured.
    Fault { ts: SystemTime, error: Error },
}

impl<A> Observation<A> {
    /// The same observation for another action type. Only the variants that do
    /// not carry actions survive.
    pub fn retag<B>(&self) -> Option<Observation<B>> {
        match self {
            Observation::Action { .. } | Observation::Effect { .. } => None,
            Observation::Failure {
                ts,
                func,
                reason,
                handled,
            } => Some(Observation::Failure {
                ts: *ts,
                func: *func,
                reason: reason.clone(),
                handled: *handled,
            }),
            Observation::Fault { ts, error } => Some(Observation::Fault {
                ts: *ts,
                error: error.clone(),
            }),
        }
    }
}
