//! Effect runner: turns a [`Cmd`] into work and the work into actions.
//!
//! Every run function in the tree is invoked inside [`execute`] itself, so a
//! function that reads state sees the state committed by the same cycle that
//! produced its command. Only waiting for pending results happens later.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};

use crate::cmd::{Cmd, ListCmd, RunCmd};
use crate::effects::Effects;
use crate::run::Job;
use crate::{Deferred, Error, Failure};

/// A started command.
pub enum Execution<A> {
    /// Finished without suspending.
    Ready(Vec<A>),
    /// Still waiting on run functions or list children.
    Pending(BoxFuture<'static, Vec<A>>),
}

impl<A: Send + 'static> Execution<A> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Execution::Ready(_))
    }

    /// Actions to redispatch once everything has completed.
    pub async fn settle(self) -> Vec<A> {
        match self {
            Execution::Ready(actions) => actions,
            Execution::Pending(fut) => fut.await,
        }
    }

    pub fn map<B: Send + 'static>(self, f: impl Fn(A) -> B + Send + 'static) -> Execution<B> {
        match self {
            Execution::Ready(actions) => Execution::Ready(actions.into_iter().map(f).collect()),
            Execution::Pending(fut) => Execution::Pending(
                fut.map(move |actions| actions.into_iter().map(f).collect()).boxed(),
            ),
        }
    }
}

impl<A> std::fmt::Debug for Execution<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Execution::Ready(actions) => write!(f, "Execution::Ready({} actions)", actions.len()),
            Execution::Pending(_) => f.write_str("Execution::Pending"),
        }
    }
}

/// A command that hit a configuration error part way through starting.
///
/// Nothing after the failing command is started. Whatever had already been
/// started is in `started` and still has to be driven to completion, like any
/// other [`Execution`].
pub struct Aborted<A> {
    pub error: Error,
    pub started: Execution<A>,
}

impl<A: Send + 'static> Aborted<A> {
    fn new(error: Error) -> Self {
        Aborted {
            error,
            started: Execution::Ready(Vec::new()),
        }
    }

    pub fn map<B: Send + 'static>(self, f: impl Fn(A) -> B + Send + 'static) -> Aborted<B> {
        Aborted {
            error: self.error,
            started: self.started.map(f),
        }
    }
}

impl<A> std::fmt::Debug for Aborted<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aborted")
            .field("error", &self.error)
            .field("started", &self.started)
            .finish()
    }
}

/// Start `cmd`.
///
/// Effect failures never surface here; they become actions or observations.
/// The only error is a configuration error such as a `force_sync` run
/// function that did not finish synchronously.
pub fn execute<A>(cmd: &Cmd<A>, effects: &Effects<A>) -> Result<Execution<A>, Aborted<A>>
where
    A: Clone + Send + 'static,
{
    match cmd {
        Cmd::None => Ok(Execution::Ready(Vec::new())),
        Cmd::Action(action) => Ok(Execution::Ready(vec![action.clone()])),
        Cmd::Run(run) => start_run(run, effects),
        Cmd::Map(map) => map.nested.execute(effects),
        Cmd::List(list) => start_list(list, effects),
    }
}

fn start_run<A>(run: &RunCmd<A>, effects: &Effects<A>) -> Result<Execution<A>, Aborted<A>>
where
    A: Send + 'static,
{
    let job = Arc::clone(&run.job);
    let deferred = panic::catch_unwind(AssertUnwindSafe(|| job.invoke(effects)))
        .unwrap_or_else(|payload| Deferred::Ready(Err(Failure::from_panic(payload))));

    match deferred {
        Deferred::Ready(outcome) => Ok(Execution::Ready(conclude(&*job, outcome, effects))),
        Deferred::Pending(_) if run.force_sync => {
            Err(Aborted::new(Error::ForceSync { func: job.name() }))
        }
        Deferred::Pending(fut) => {
            let effects = effects.clone();
            Ok(Execution::Pending(
                async move {
                    let outcome = AssertUnwindSafe(fut)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| Err(Failure::from_panic(payload)));
                    conclude(&*job, outcome, &effects)
                }
                .boxed(),
            ))
        }
    }
}

/// Map a finished run into at most one action, reporting the failure when
/// appropriate. A fail constructor that panics leaves the failure unhandled.
fn conclude<A>(
    job: &dyn Job<A>,
    outcome: Result<Option<A>, Failure>,
    effects: &Effects<A>,
) -> Vec<A>
where
    A: Send + 'static,
{
    let reason = match outcome {
        Ok(action) => return action.into_iter().collect(),
        Err(reason) => reason,
    };
    match panic::catch_unwind(AssertUnwindSafe(|| job.fail(reason.clone()))) {
        Ok(Some(action)) => {
            if !effects.config().suppress_log_on_handled_failure {
                effects.report_failure(job.name(), reason, true);
            }
            vec![action]
        }
        Ok(None) => {
            effects.report_failure(job.name(), reason, false);
            Vec::new()
        }
        Err(payload) => {
            effects.report_failure(job.name(), Failure::from_panic(payload), false);
            Vec::new()
        }
    }
}

/// Releases child actions in the order a list's policy demands.
struct Release<A> {
    sequence: bool,
    next: usize,
    held: BTreeMap<usize, Vec<A>>,
}

impl<A> Release<A> {
    fn new(sequence: bool) -> Self {
        Release {
            sequence,
            next: 0,
            held: BTreeMap::new(),
        }
    }

    /// Child `index` finished with `actions`; returns whatever may go out now.
    fn offer(&mut self, index: usize, actions: Vec<A>) -> Vec<A> {
        if !self.sequence {
            return actions;
        }
        self.held.insert(index, actions);
        let mut released = Vec::new();
        while let Some(actions) = self.held.remove(&self.next) {
            released.extend(actions);
            self.next += 1;
        }
        released
    }
}

fn start_list<A>(list: &ListCmd<A>, effects: &Effects<A>) -> Result<Execution<A>, Aborted<A>>
where
    A: Clone + Send + 'static,
{
    let batch = list.options.batch;
    let mut release = Release::new(list.options.sequence);
    let mut released = Vec::new();
    let mut pending = Vec::new();
    let mut error = None;

    // Start every child before waiting on any of them. A configuration error
    // stops further children from starting; the ones already started carry on.
    for (index, child) in list.cmds.iter().enumerate() {
        let started = match execute(child, effects) {
            Ok(started) => started,
            Err(aborted) => {
                error = Some(aborted.error);
                aborted.started
            }
        };
        match started {
            Execution::Ready(actions) => released.extend(release.offer(index, actions)),
            Execution::Pending(fut) => pending.push(fut.map(move |actions| (index, actions))),
        }
        if error.is_some() {
            break;
        }
    }

    if !batch {
        for action in released.drain(..) {
            let _ = effects.dispatch(action);
        }
    }

    let execution = if pending.is_empty() {
        Execution::Ready(released)
    } else {
        let effects = effects.clone();
        Execution::Pending(
            async move {
                let mut in_flight: FuturesUnordered<_> = pending.into_iter().collect();
                while let Some((index, actions)) = in_flight.next().await {
                    for action in release.offer(index, actions) {
                        if batch {
                            released.push(action);
                        } else {
                            let _ = effects.dispatch(action);
                        }
                    }
                }
                released
            }
            .boxed(),
        )
    };

    match error {
        Some(error) => Err(Aborted {
            error,
            started: execution,
        }),
        None => Ok(execution),
    }
}
