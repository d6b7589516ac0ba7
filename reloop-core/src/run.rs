use std::any::{type_name, Any, TypeId};
use std::fmt::{self, Debug};
use std::mem::size_of;
use std::ptr;
use std::sync::Arc;

use crate::cmd::{Cmd, RunCmd};
use crate::effects::Effects;
use crate::{Deferred, Failure, SimulationError};

/// Identity of a function item or closure type.
///
/// Every fn item and closure expression has its own type, so two commands
/// built by the same line of reducer code compare equal while commands naming
/// different functions never do. A closure that captures values is only equal
/// to itself: its type says nothing about what it captured.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FnId {
    id: TypeId,
    name: &'static str,
    stateless: bool,
}

impl FnId {
    pub(crate) fn of<F: 'static>() -> Self {
        FnId {
            id: TypeId::of::<F>(),
            name: type_name::<F>(),
            stateless: size_of::<F>() == 0,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `this` and `that`, identified by `self` and `other`, are the
    /// same function.
    pub(crate) fn same<F: ?Sized>(&self, this: &Arc<F>, other: &FnId, that: &Arc<F>) -> bool {
        self.id == other.id
            && (self.stateless
                || ptr::eq(Arc::as_ptr(this) as *const (), Arc::as_ptr(that) as *const ()))
    }
}

/// Bounds on the argument value handed to a run function. Arguments take part
/// in command equality and are printed by `Debug`.
pub trait RunArgs: Clone + PartialEq + Debug + Send + Sync + 'static {}

impl<T> RunArgs for T where T: Clone + PartialEq + Debug + Send + Sync + 'static {}

type Invoke<A, Args, T> = Arc<dyn Fn(Args, &Effects<A>) -> Deferred<T> + Send + Sync>;

/// Action constructor applied to a run outcome.
pub(crate) struct Creator<T, A> {
    id: FnId,
    f: Arc<dyn Fn(T) -> A + Send + Sync>,
}

impl<T, A> Creator<T, A> {
    fn new<F>(f: F) -> Self
    where
        F: Fn(T) -> A + Send + Sync + 'static,
    {
        Creator {
            id: FnId::of::<F>(),
            f: Arc::new(f),
        }
    }

    fn call(&self, value: T) -> A {
        (self.f)(value)
    }
}

impl<T, A> Clone for Creator<T, A> {
    fn clone(&self) -> Self {
        Creator {
            id: self.id,
            f: Arc::clone(&self.f),
        }
    }
}

/// Type-erased run command, seen by the runner and the simulator without
/// knowing the function's argument or output types.
pub(crate) trait Job<A>: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn handles_failure(&self) -> bool;

    /// Call the function. A successful value has already been passed through
    /// the success constructor.
    fn invoke(&self, effects: &Effects<A>) -> Deferred<Option<A>>;

    fn fail(&self, reason: Failure) -> Option<A>;

    fn simulate_success(&self, value: Box<dyn Any + Send>) -> Result<Option<A>, SimulationError>;

    fn same(&self, other: &dyn Job<A>) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn describe(&self, d: &mut fmt::DebugStruct<'_, '_>);
}

/// Run command under construction, returned by [`Cmd::run`] and
/// [`Cmd::run_with`]. Converts into a [`Cmd`] with `.into()`.
pub struct Run<A, T, Args> {
    func: FnId,
    invoke: Invoke<A, Args, T>,
    args: Args,
    on_success: Option<Creator<T, A>>,
    on_failure: Option<Creator<Failure, A>>,
    force_sync: bool,
}

impl<A, T, Args> Run<A, T, Args>
where
    A: Send + 'static,
    T: Send + 'static,
    Args: RunArgs,
{
    pub(crate) fn new(func: FnId, invoke: Invoke<A, Args, T>, args: Args) -> Self {
        Run {
            func,
            invoke,
            args,
            on_success: None,
            on_failure: None,
            force_sync: false,
        }
    }

    /// Turn the function's result into an action.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(T) -> A + Send + Sync + 'static,
    {
        self.on_success = Some(Creator::new(f));
        self
    }

    /// Turn a failure into an action instead of reporting it.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(Failure) -> A + Send + Sync + 'static,
    {
        self.on_failure = Some(Creator::new(f));
        self
    }

    /// Require the function to finish synchronously. Returning a pending
    /// result is then a configuration error.
    pub fn force_sync(mut self) -> Self {
        self.force_sync = true;
        self
    }
}

impl<A, T, Args> From<Run<A, T, Args>> for Cmd<A>
where
    A: Send + 'static,
    T: Send + 'static,
    Args: RunArgs,
{
    fn from(run: Run<A, T, Args>) -> Self {
        Cmd::Run(RunCmd {
            force_sync: run.force_sync,
            job: Arc::new(Call {
                func: run.func,
                invoke: run.invoke,
                args: run.args,
                on_success: run.on_success,
                on_failure: run.on_failure,
            }),
        })
    }
}

struct Call<A, T, Args> {
    func: FnId,
    invoke: Invoke<A, Args, T>,
    args: Args,
    on_success: Option<Creator<T, A>>,
    on_failure: Option<Creator<Failure, A>>,
}

fn creator_name<T, A>(creator: &Option<Creator<T, A>>) -> Option<&'static str> {
    creator.as_ref().map(|c| c.id.name())
}

fn same_creator<T, A>(a: &Option<Creator<T, A>>, b: &Option<Creator<T, A>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.id.same(&a.f, &b.id, &b.f),
        _ => false,
    }
}

impl<A, T, Args> Job<A> for Call<A, T, Args>
where
    A: Send + 'static,
    T: Send + 'static,
    Args: RunArgs,
{
    fn name(&self) -> &'static str {
        self.func.name()
    }

    fn handles_failure(&self) -> bool {
        self.on_failure.is_some()
    }

    fn invoke(&self, effects: &Effects<A>) -> Deferred<Option<A>> {
        let on_success = self.on_success.clone();
        (self.invoke)(self.args.clone(), effects)
            .map(move |value| on_success.map(|creator| creator.call(value)))
    }

    fn fail(&self, reason: Failure) -> Option<A> {
        self.on_failure.as_ref().map(|creator| creator.call(reason))
    }

    fn simulate_success(&self, value: Box<dyn Any + Send>) -> Result<Option<A>, SimulationError> {
        match value.downcast::<T>() {
            Ok(value) => Ok(self.on_success.as_ref().map(|creator| creator.call(*value))),
            Err(_) => Err(SimulationError::ResultType {
                func: self.func.name(),
                expected: type_name::<T>(),
            }),
        }
    }

    fn same(&self, other: &dyn Job<A>) -> bool {
        other.as_any().downcast_ref::<Self>().is_some_and(|other| {
            self.func.same(&self.invoke, &other.func, &other.invoke)
                && self.args == other.args
                && same_creator(&self.on_success, &other.on_success)
                && same_creator(&self.on_failure, &other.on_failure)
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self, d: &mut fmt::DebugStruct<'_, '_>) {
        d.field("func", &self.func.name())
            .field("args", &self.args)
            .field("on_success", &creator_name(&self.on_success))
            .field("on_failure", &creator_name(&self.on_failure));
    }
}
