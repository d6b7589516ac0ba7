use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::effects::{enqueue, Envelope};
use crate::runner::{execute, Aborted, Execution};
use crate::{
    lift_state, tracing_observer, Cmd, Config, Dispatch, Dispatched, Effects, Error, Loop,
    Observation, ObserverFn, Reduction,
};

type BoxReducer<S, A> = Box<dyn Fn(&S, A) -> Loop<S, A> + Send>;

type InFlight<A> = FuturesUnordered<BoxFuture<'static, Vec<A>>>;

/// The committed state. Written only by the runtime loop.
struct Committed<S>(Arc<RwLock<Arc<S>>>);

impl<S> Clone for Committed<S> {
    fn clone(&self) -> Self {
        Committed(Arc::clone(&self.0))
    }
}

impl<S> Committed<S> {
    fn new(state: S) -> Self {
        Committed(Arc::new(RwLock::new(Arc::new(state))))
    }

    fn read(&self) -> Arc<S> {
        Arc::clone(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn commit(&self, state: S) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(state);
    }
}

/// Handle used by application code to dispatch actions and read state.
///
/// Cheap to clone. The [`Runtime`] stops once every handle is dropped and no
/// effect is still pending.
pub struct Store<S, A> {
    tx: UnboundedSender<Envelope<A>>,
    state: Committed<S>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Store {
            tx: self.tx.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Queue `action`. The returned future resolves once the action has been
    /// reduced, its state committed and its command started; it fails if
    /// starting the command hit a configuration error.
    pub fn dispatch(&self, action: A) -> Dispatched {
        enqueue(&self.tx, action)
    }

    pub fn dispatcher(&self) -> Dispatch<A> {
        Dispatch::channel(self.tx.clone())
    }

    /// Snapshot of the committed state.
    pub fn get_state(&self) -> Arc<S> {
        self.state.read()
    }
}

/// The loop that owns the reducer. Drive it with [`Runtime::run`].
pub struct Runtime<S, A> {
    reducer: BoxReducer<S, A>,
    state: Committed<S>,
    config: Config,
    observer: ObserverFn<A>,
    init: Option<Cmd<A>>,
    action_rx: UnboundedReceiver<Envelope<A>>,
    effect_tx: UnboundedSender<Envelope<A>>,
    effect_rx: UnboundedReceiver<Envelope<A>>,
}

/// Create a store around `reducer`, starting from `initial`.
pub fn create_store<S, A, F, R>(
    reducer: F,
    initial: S,
    config: Config,
) -> (Store<S, A>, Runtime<S, A>)
where
    S: Send + Sync + 'static,
    A: Clone + Debug + Send + 'static,
    F: Fn(&S, A) -> R + Send + 'static,
    R: Into<Reduction<S, A>>,
{
    install(reducer, Loop::new(initial, Cmd::None), config)
}

/// Like [`create_store`], but the initial state comes with a command that
/// runs as soon as the runtime starts.
pub fn install<S, A, F, R>(
    reducer: F,
    initial: Loop<S, A>,
    config: Config,
) -> (Store<S, A>, Runtime<S, A>)
where
    S: Send + Sync + 'static,
    A: Clone + Debug + Send + 'static,
    F: Fn(&S, A) -> R + Send + 'static,
    R: Into<Reduction<S, A>>,
{
    let (state, init) = initial.into_parts();
    let (action_tx, action_rx) = unbounded_channel();
    let (effect_tx, effect_rx) = unbounded_channel();
    let state = Committed::new(state);

    let store = Store {
        tx: action_tx,
        state: state.clone(),
    };
    let runtime = Runtime {
        reducer: Box::new(move |state: &S, action: A| lift_state(reducer(state, action))),
        state,
        config,
        observer: tracing_observer(),
        init: Some(init),
        action_rx,
        effect_tx,
        effect_rx,
    };
    (store, runtime)
}

impl<S, A> Runtime<S, A>
where
    S: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    pub fn with_observer(mut self, observer: ObserverFn<A>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn effects(&self) -> Effects<A> {
        let state = self.state.clone();
        Effects::from_parts(
            Dispatch::channel(self.effect_tx.clone()),
            Arc::clone(&self.observer),
            self.config,
        )
        .with_state(move || state.read())
    }

    /// Process actions until every [`Store`] handle is dropped and no effect
    /// is left pending, then return the final state.
    pub async fn run(mut self) -> Arc<S> {
        let effects = self.effects();
        let mut in_flight: InFlight<A> = FuturesUnordered::new();

        if let Some(cmd) = self.init.take() {
            // A misconfigured initial command has no caller; it is reported
            // to the observer as a fault.
            let _ = self.start(cmd, &effects, &mut in_flight);
        }

        let mut accepting = true;
        loop {
            if !accepting && in_flight.is_empty() {
                match self.effect_rx.try_recv() {
                    Ok(envelope) => {
                        self.cycle(envelope, &effects, &mut in_flight);
                        continue;
                    }
                    Err(_) => break,
                }
            }

            tokio::select! {
                envelope = self.action_rx.recv(), if accepting => match envelope {
                    Some(envelope) => self.cycle(envelope, &effects, &mut in_flight),
                    None => accepting = false,
                },
                Some(envelope) = self.effect_rx.recv() => {
                    self.cycle(envelope, &effects, &mut in_flight);
                }
                Some(actions) = in_flight.next(), if !in_flight.is_empty() => {
                    for action in actions {
                        self.cycle(Envelope::new(action), &effects, &mut in_flight);
                    }
                }
            }
        }

        tracing::debug!(
            target: "reloop-core::Runtime",
            "no stores and no pending effects left; stopping"
        );
        self.state.read()
    }

    /// One dispatch cycle: reduce, commit, start the command, acknowledge.
    fn cycle(&self, envelope: Envelope<A>, effects: &Effects<A>, in_flight: &mut InFlight<A>) {
        let Envelope { action, ack } = envelope;
        (self.observer)(&Observation::Action {
            ts: SystemTime::now(),
            data: action.clone(),
        });

        let current = self.state.read();
        let (next, cmd) = (self.reducer)(&current, action).into_parts();
        self.state.commit(next);

        let started = self.start(cmd, effects, in_flight);
        if let Some(ack) = ack {
            let _ = ack.send(started);
        }
    }

    fn start(
        &self,
        cmd: Cmd<A>,
        effects: &Effects<A>,
        in_flight: &mut InFlight<A>,
    ) -> Result<(), Error> {
        if cmd.is_none() {
            return Ok(());
        }
        (self.observer)(&Observation::Effect {
            ts: SystemTime::now(),
            data: cmd.clone(),
        });

        let (started, fault) = match execute(&cmd, effects) {
            Ok(started) => (started, None),
            Err(Aborted { error, started }) => {
                (self.observer)(&Observation::Fault {
                    ts: SystemTime::now(),
                    error: error.clone(),
                });
                (started, Some(error))
            }
        };
        // Whatever started before a fault still runs to completion.
        match started {
            Execution::Ready(actions) => {
                for action in actions {
                    let _ = self.effect_tx.send(Envelope::new(action));
                }
            }
            Execution::Pending(fut) => in_flight.push(fut),
        }
        match fault {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
