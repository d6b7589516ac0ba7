use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::SystemTime;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

use crate::{tracing_observer, Config, Error, Observation, ObserverFn};

/// An action on its way into the runtime loop, with the acknowledgement to
/// complete once it has been reduced and committed.
pub(crate) struct Envelope<A> {
    pub(crate) action: A,
    pub(crate) ack: Option<oneshot::Sender<Result<(), Error>>>,
}

impl<A> Envelope<A> {
    pub(crate) fn new(action: A) -> Self {
        Envelope { action, ack: None }
    }
}

/// Queue `action` for the runtime loop.
pub(crate) fn enqueue<A>(tx: &UnboundedSender<Envelope<A>>, action: A) -> Dispatched {
    let (ack, rx) = oneshot::channel();
    match tx.send(Envelope {
        action,
        ack: Some(ack),
    }) {
        Ok(()) => Dispatched::waiting(rx),
        Err(_) => Dispatched::ready(Err(Error::Closed)),
    }
}

/// Resolves once a dispatched action has been reduced and its state
/// committed. Effects started by that action may still be running.
pub struct Dispatched {
    state: Ack,
}

enum Ack {
    Done(Option<Result<(), Error>>),
    Waiting(oneshot::Receiver<Result<(), Error>>),
}

impl Dispatched {
    pub fn ready(result: Result<(), Error>) -> Self {
        Dispatched {
            state: Ack::Done(Some(result)),
        }
    }

    pub(crate) fn waiting(rx: oneshot::Receiver<Result<(), Error>>) -> Self {
        Dispatched {
            state: Ack::Waiting(rx),
        }
    }
}

impl Future for Dispatched {
    type Output = Result<(), Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            Ack::Done(result) => Poll::Ready(result.take().unwrap_or(Ok(()))),
            // A dropped ack sender means the runtime went away before the commit.
            Ack::Waiting(rx) => Pin::new(rx).poll(cx).map(|res| res.unwrap_or(Err(Error::Closed))),
        }
    }
}

/// Capability to feed an action back into the store.
pub struct Dispatch<A> {
    send: Arc<dyn Fn(A) -> Dispatched + Send + Sync>,
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Dispatch {
            send: Arc::clone(&self.send),
        }
    }
}

impl<A: Send + 'static> Dispatch<A> {
    pub fn new(send: impl Fn(A) -> Dispatched + Send + Sync + 'static) -> Self {
        Dispatch {
            send: Arc::new(send),
        }
    }

    /// Dispatch into a plain callback; the acknowledgement resolves at once.
    pub fn sink(f: impl Fn(A) + Send + Sync + 'static) -> Self {
        Dispatch::new(move |action| {
            f(action);
            Dispatched::ready(Ok(()))
        })
    }

    /// Dispatch into the runtime loop over `tx`.
    pub(crate) fn channel(tx: UnboundedSender<Envelope<A>>) -> Self {
        Dispatch::new(move |action| enqueue(&tx, action))
    }

    pub fn send(&self, action: A) -> Dispatched {
        (self.send)(action)
    }

    /// Dispatch for another action type, converting through `f`.
    pub fn contramap<B: Send + 'static>(
        &self,
        f: Arc<dyn Fn(B) -> A + Send + Sync>,
    ) -> Dispatch<B> {
        let outer = self.clone();
        Dispatch::new(move |action| outer.send(f(action)))
    }
}

type ReadState = Arc<dyn Fn() -> Arc<dyn Any + Send + Sync> + Send + Sync>;

/// Capabilities handed to the runner, and through [`crate::Cmd::run_with`] to
/// run functions: dispatching actions, reading the committed state, and the
/// observer that failures are reported to.
pub struct Effects<A> {
    dispatch: Dispatch<A>,
    read_state: Option<ReadState>,
    observer: ObserverFn<A>,
    config: Config,
}

impl<A> Clone for Effects<A> {
    fn clone(&self) -> Self {
        Effects {
            dispatch: self.dispatch.clone(),
            read_state: self.read_state.clone(),
            observer: Arc::clone(&self.observer),
            config: self.config,
        }
    }
}

impl<A: Send + 'static> Effects<A> {
    pub(crate) fn from_parts(
        dispatch: Dispatch<A>,
        observer: ObserverFn<A>,
        config: Config,
    ) -> Self {
        Effects {
            dispatch,
            read_state: None,
            observer,
            config,
        }
    }

    /// Capabilities with no state to read, default config and the tracing
    /// observer.
    pub fn new(dispatch: Dispatch<A>) -> Self
    where
        A: std::fmt::Debug,
    {
        Effects::from_parts(dispatch, tracing_observer(), Config::default())
    }

    pub fn with_state<S>(mut self, read: impl Fn() -> Arc<S> + Send + Sync + 'static) -> Self
    where
        S: Send + Sync + 'static,
    {
        self.read_state = Some(Arc::new(move || read() as Arc<dyn Any + Send + Sync>));
        self
    }

    pub fn with_observer(mut self, observer: ObserverFn<A>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn dispatch(&self, action: A) -> Dispatched {
        self.dispatch.send(action)
    }

    pub fn dispatcher(&self) -> Dispatch<A> {
        self.dispatch.clone()
    }

    /// Snapshot of the committed state, or `None` when no state is attached
    /// or it is not an `S`.
    pub fn get_state<S: Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        let read = self.read_state.as_ref()?;
        read().downcast::<S>().ok()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn observe(&self, observation: Observation<A>) {
        (self.observer)(&observation);
    }

    pub(crate) fn report_failure(&self, func: &'static str, reason: crate::Failure, handled: bool) {
        self.observe(Observation::Failure {
            ts: SystemTime::now(),
            func,
            reason,
            handled,
        });
    }

    /// Capabilities for a nested command whose actions go through `tag`.
    pub(crate) fn tagged<B: Send + 'static>(
        &self,
        tag: Arc<dyn Fn(B) -> A + Send + Sync>,
    ) -> Effects<B> {
        let observer = Arc::clone(&self.observer);
        Effects {
            dispatch: self.dispatch.contramap(tag),
            read_state: self.read_state.clone(),
            observer: Arc::new(move |observation: &Observation<B>| {
                if let Some(observation) = observation.retag() {
                    observer(&observation);
                }
            }),
            config: self.config,
        }
    }
}
