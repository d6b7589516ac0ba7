use std::fmt;

use crate::Cmd;

/// New state paired with the command to run once it is committed.
///
/// Fields are private: [`loop_`] and [`Loop::new`] are the only way in, so a
/// plain state value can never be mistaken for a loop.
pub struct Loop<S, A> {
    state: S,
    cmd: Cmd<A>,
}

impl<S, A> Loop<S, A> {
    pub fn new(state: S, cmd: impl Into<Cmd<A>>) -> Self {
        Loop {
            state,
            cmd: cmd.into(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn cmd(&self) -> &Cmd<A> {
        &self.cmd
    }

    pub fn into_parts(self) -> (S, Cmd<A>) {
        (self.state, self.cmd)
    }
}

/// Pair `state` with `cmd`.
pub fn loop_<S, A>(state: S, cmd: impl Into<Cmd<A>>) -> Loop<S, A> {
    Loop::new(state, cmd)
}

impl<S: fmt::Debug, A: fmt::Debug + 'static> fmt::Debug for Loop<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loop")
            .field("state", &self.state)
            .field("cmd", &self.cmd)
            .finish()
    }
}

impl<S: PartialEq, A: PartialEq + 'static> PartialEq for Loop<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.cmd == other.cmd
    }
}

/// What a reducer hands back: bare state, or state with a command.
pub enum Reduction<S, A> {
    State(S),
    Loop(Loop<S, A>),
}

impl<S: fmt::Debug, A: fmt::Debug + 'static> fmt::Debug for Reduction<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reduction::State(state) => f.debug_tuple("State").field(state).finish(),
            Reduction::Loop(looped) => f.debug_tuple("Loop").field(looped).finish(),
        }
    }
}

impl<S: PartialEq, A: PartialEq + 'static> PartialEq for Reduction<S, A> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Reduction::State(a), Reduction::State(b)) => a == b,
            (Reduction::Loop(a), Reduction::Loop(b)) => a == b,
            _ => false,
        }
    }
}

impl<S, A> From<Loop<S, A>> for Reduction<S, A> {
    fn from(looped: Loop<S, A>) -> Self {
        Reduction::Loop(looped)
    }
}

/// Normalise a reducer result to a loop; bare state gets [`Cmd::None`].
pub fn lift_state<S, A>(result: impl Into<Reduction<S, A>>) -> Loop<S, A> {
    match result.into() {
        Reduction::State(state) => Loop::new(state, Cmd::None),
        Reduction::Loop(looped) => looped,
    }
}

pub fn is_loop<S, A>(result: &Reduction<S, A>) -> bool {
    matches!(result, Reduction::Loop(_))
}

pub fn get_model<S, A>(result: Reduction<S, A>) -> S {
    match result {
        Reduction::State(state) => state,
        Reduction::Loop(looped) => looped.state,
    }
}

pub fn get_cmd<S, A>(result: &Reduction<S, A>) -> Option<&Cmd<A>> {
    match result {
        Reduction::State(_) => None,
        Reduction::Loop(looped) => Some(&looped.cmd),
    }
}
