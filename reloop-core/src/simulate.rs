//! Effect-free evaluation of commands, for testing reducers.
//!
//! ```ignore
//! let (_, cmd) = reduce(&state, Msg::Fetch(7)).into_parts();
//! let actions = cmd.simulate(StandIn::success(User::named("ada")))?;
//! assert_eq!(actions, vec![Msg::Loaded(User::named("ada"))]);
//! ```

use std::any::Any;
use std::fmt;

use crate::cmd::Cmd;
use crate::{Failure, SimulationError};

/// Outcome to pretend each leaf of a command produced. The tree must mirror
/// the command: a `Map` uses its nested command's stand-in unchanged.
pub enum StandIn {
    /// For `None` and `Action` commands.
    Empty,
    /// A run function returned this value.
    Success(Box<dyn Any + Send>),
    /// A run function failed.
    Failure(Failure),
    /// One stand-in per list child.
    List(Vec<StandIn>),
}

impl StandIn {
    pub fn success<T: Send + 'static>(value: T) -> Self {
        StandIn::Success(Box::new(value))
    }

    pub fn failure(reason: impl Into<Failure>) -> Self {
        StandIn::Failure(reason.into())
    }

    pub fn list(items: impl IntoIterator<Item = StandIn>) -> Self {
        StandIn::List(items.into_iter().collect())
    }

    fn kind(&self) -> &'static str {
        match self {
            StandIn::Empty => "empty",
            StandIn::Success(_) => "success",
            StandIn::Failure(_) => "failure",
            StandIn::List(_) => "list",
        }
    }
}

impl fmt::Debug for StandIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StandIn::Empty => f.write_str("Empty"),
            StandIn::Success(_) => f.write_str("Success(..)"),
            StandIn::Failure(reason) => f.debug_tuple("Failure").field(reason).finish(),
            StandIn::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

/// Actions `cmd` would produce if its run functions ended as `stand_in` says.
///
/// Never calls a run function, dispatches or reads state; only outcome
/// constructors and taggers run. List children contribute in child order.
/// Actions a live list would dispatch directly are included, so the result is
/// everything the command emits.
pub fn simulate<A: Clone + 'static>(
    cmd: &Cmd<A>,
    stand_in: StandIn,
) -> Result<Vec<A>, SimulationError> {
    match (cmd, stand_in) {
        (Cmd::None, StandIn::Empty) => Ok(Vec::new()),
        (Cmd::Action(action), StandIn::Empty) => Ok(vec![action.clone()]),
        (Cmd::Run(run), StandIn::Success(value)) => {
            Ok(run.job.simulate_success(value)?.into_iter().collect())
        }
        (Cmd::Run(run), StandIn::Failure(reason)) => Ok(run.job.fail(reason).into_iter().collect()),
        (Cmd::Map(map), stand_in) => map.nested.simulate(stand_in),
        (Cmd::List(list), StandIn::List(items)) => {
            if items.len() != list.cmds.len() {
                return Err(SimulationError::Length {
                    expected: list.cmds.len(),
                    found: items.len(),
                });
            }
            let mut actions = Vec::new();
            for (child, item) in list.cmds.iter().zip(items) {
                actions.extend(simulate(child, item)?);
            }
            Ok(actions)
        }
        (cmd, stand_in) => Err(SimulationError::Shape {
            cmd: cmd.kind(),
            expected: match cmd {
                Cmd::Run(_) => "success or failure",
                Cmd::List(_) => "list",
                _ => "empty",
            },
            found: stand_in.kind(),
        }),
    }
}
