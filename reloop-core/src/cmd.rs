use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

use crate::effects::Effects;
use crate::map::{Nested, Tagged};
use crate::run::{FnId, Job, Run, RunArgs};
use crate::simulate::{simulate, StandIn};
use crate::{IntoDeferred, SimulationError};

/// Description of the effects a reducer wants run after its state is
/// committed.
///
/// A `Cmd` is inert data: building one never calls the functions it refers to.
/// Reducers may be called any number of times and keep returning equal
/// commands; only the runtime turns them into work.
pub enum Cmd<A> {
    /// Nothing to do.
    None,
    /// Dispatch this action.
    Action(A),
    /// Call a function and turn its outcome into an action.
    Run(RunCmd<A>),
    /// Run a command built for another action type and tag what it produces.
    Map(MapCmd<A>),
    /// Run several commands.
    List(ListCmd<A>),
}

/// A run function with its arguments and outcome constructors, see [`Cmd::run`].
pub struct RunCmd<A> {
    pub(crate) job: Arc<dyn Job<A>>,
    pub(crate) force_sync: bool,
}

impl<A: 'static> RunCmd<A> {
    /// Type name of the function this command calls.
    pub fn func_name(&self) -> &'static str {
        self.job.name()
    }

    pub fn is_force_sync(&self) -> bool {
        self.force_sync
    }

    pub fn handles_failure(&self) -> bool {
        self.job.handles_failure()
    }
}

/// A nested command plus the tagger applied to its actions, see [`Cmd::map`].
pub struct MapCmd<A> {
    pub(crate) nested: Arc<dyn Nested<A>>,
}

/// Ordering policy for a [`Cmd::List`].
///
/// `sequence` releases child actions in child order regardless of which child
/// finishes first. `batch` holds every action until all children are done and
/// hands them back together instead of dispatching them as they come.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub sequence: bool,
    pub batch: bool,
}

pub struct ListCmd<A> {
    pub(crate) cmds: Vec<Cmd<A>>,
    pub(crate) options: ListOptions,
}

impl<A> ListCmd<A> {
    pub fn cmds(&self) -> &[Cmd<A>] {
        &self.cmds
    }

    pub fn options(&self) -> ListOptions {
        self.options
    }
}

impl<A> Cmd<A> {
    /// No-op command.
    pub fn none() -> Self {
        Cmd::None
    }

    pub fn action(action: A) -> Self {
        Cmd::Action(action)
    }

    /// Run children concurrently, dispatching their actions as they finish.
    pub fn list(cmds: impl IntoIterator<Item = Cmd<A>>) -> Self {
        Self::list_with(cmds, ListOptions::default())
    }

    pub fn list_with(cmds: impl IntoIterator<Item = Cmd<A>>, options: ListOptions) -> Self {
        Cmd::List(ListCmd {
            cmds: cmds.into_iter().collect(),
            options,
        })
    }

    /// List whose actions come out in child order.
    pub fn sequence(cmds: impl IntoIterator<Item = Cmd<A>>) -> Self {
        Self::list_with(
            cmds,
            ListOptions {
                sequence: true,
                batch: false,
            },
        )
    }

    /// List whose actions are handed back together once every child is done.
    pub fn batch(cmds: impl IntoIterator<Item = Cmd<A>>) -> Self {
        Self::list_with(
            cmds,
            ListOptions {
                sequence: false,
                batch: true,
            },
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Cmd::None)
    }

    /// Variant name, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Cmd::None => "none",
            Cmd::Action(_) => "action",
            Cmd::Run(_) => "run",
            Cmd::Map(_) => "map",
            Cmd::List(_) => "list",
        }
    }
}

impl<A: Send + 'static> Cmd<A> {
    /// Call `func(args)` when the command runs.
    ///
    /// `func` returns a `Result` for synchronous work or a [`crate::Deferred`]
    /// for anything that has to be awaited. Without `on_success`/`on_failure`
    /// the outcome produces no action; a failure nobody handles is reported to
    /// the observer.
    pub fn run<F, Args, R, T>(func: F, args: Args) -> Run<A, T, Args>
    where
        F: Fn(Args) -> R + Send + Sync + 'static,
        R: IntoDeferred<T>,
        Args: RunArgs,
        T: Send + 'static,
    {
        Run::new(
            FnId::of::<F>(),
            Arc::new(move |args: Args, _: &Effects<A>| func(args).into_deferred()),
            args,
        )
    }

    /// Like [`Cmd::run`], but `func` also receives the runtime capabilities:
    /// it may dispatch actions itself and read the committed state.
    pub fn run_with<F, Args, R, T>(func: F, args: Args) -> Run<A, T, Args>
    where
        F: Fn(Args, Effects<A>) -> R + Send + Sync + 'static,
        R: IntoDeferred<T>,
        Args: RunArgs,
        T: Send + 'static,
    {
        Run::new(
            FnId::of::<F>(),
            Arc::new(move |args: Args, effects: &Effects<A>| {
                func(args, effects.clone()).into_deferred()
            }),
            args,
        )
    }

    /// Wrap every action `cmd` produces with `tag`.
    pub fn map<B, F>(cmd: Cmd<B>, tag: F) -> Self
    where
        B: Clone + PartialEq + Debug + Send + Sync + 'static,
        F: Fn(B) -> A + Send + Sync + 'static,
    {
        Cmd::Map(MapCmd {
            nested: Arc::new(Tagged::new(
                cmd,
                FnId::of::<F>(),
                Arc::new(move |_: &(), action: B| tag(action)),
                (),
            )),
        })
    }

    /// Like [`Cmd::map`], with an extra argument handed to `tag` ahead of
    /// each action.
    pub fn map_with<B, X, F>(cmd: Cmd<B>, tag: F, extra: X) -> Self
    where
        B: Clone + PartialEq + Debug + Send + Sync + 'static,
        X: PartialEq + Debug + Send + Sync + 'static,
        F: Fn(&X, B) -> A + Send + Sync + 'static,
    {
        Cmd::Map(MapCmd {
            nested: Arc::new(Tagged::new(cmd, FnId::of::<F>(), Arc::new(tag), extra)),
        })
    }
}

impl<A: Clone + PartialEq + Debug + Send + Sync + 'static> Cmd<A> {
    /// Method form of [`Cmd::map`].
    pub fn tag<B, F>(self, tag: F) -> Cmd<B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Cmd::<B>::map(self, tag)
    }
}

impl<A: Clone + 'static> Cmd<A> {
    /// Actions this command would produce given stand-in outcomes for its
    /// run functions. See [`crate::simulate()`].
    pub fn simulate(&self, stand_in: StandIn) -> Result<Vec<A>, SimulationError> {
        simulate(self, stand_in)
    }
}

impl<A> Default for Cmd<A> {
    fn default() -> Self {
        Cmd::None
    }
}

impl<A: Clone + 'static> Clone for Cmd<A> {
    fn clone(&self) -> Self {
        match self {
            Cmd::None => Cmd::None,
            Cmd::Action(action) => Cmd::Action(action.clone()),
            Cmd::Run(run) => Cmd::Run(RunCmd {
                job: Arc::clone(&run.job),
                force_sync: run.force_sync,
            }),
            Cmd::Map(map) => Cmd::Map(MapCmd {
                nested: Arc::clone(&map.nested),
            }),
            Cmd::List(list) => Cmd::List(ListCmd {
                cmds: list.cmds.clone(),
                options: list.options,
            }),
        }
    }
}

impl<A: PartialEq + 'static> PartialEq for Cmd<A> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cmd::None, Cmd::None) => true,
            (Cmd::Action(a), Cmd::Action(b)) => a == b,
            (Cmd::Run(a), Cmd::Run(b)) => a.force_sync == b.force_sync && a.job.same(&*b.job),
            (Cmd::Map(a), Cmd::Map(b)) => a.nested.same(&*b.nested),
            (Cmd::List(a), Cmd::List(b)) => a.options == b.options && a.cmds == b.cmds,
            _ => false,
        }
    }
}

impl<A: Debug + 'static> Debug for Cmd<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::None => f.write_str("None"),
            Cmd::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Cmd::Run(run) => {
                let mut d = f.debug_struct("Run");
                run.job.describe(&mut d);
                d.field("force_sync", &run.force_sync).finish()
            }
            Cmd::Map(map) => Nested::fmt(&*map.nested, f),
            Cmd::List(list) => f
                .debug_struct("List")
                .field("cmds", &list.cmds)
                .field("sequence", &list.options.sequence)
                .field("batch", &list.options.batch)
                .finish(),
        }
    }
}
