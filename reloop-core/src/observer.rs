use crate::Observation;
use std::fmt::Debug;
use std::sync::Arc;

/// Observer function type
pub type ObserverFn<A> = Arc<dyn Fn(&Observation<A>) + Send + Sync>;

/// No-op observer
pub fn no_op_observer<A>() -> ObserverFn<A>
where
    A: 'static,
{
    Arc::new(|_observation: &Observation<A>| {})
}

/// Tracing observer - logs to tracing crate
///
/// Unhandled run failures and faults are logged at `error`, handled failures
/// at `warn`.
pub fn tracing_observer<A>() -> ObserverFn<A>
where
    A: Debug + 'static,
{
    Arc::new(move |observation: &Observation<A>| match observation {
        Observation::Action { data, .. } => {
            tracing::info!(target: "reloop-core::Action", "Action({:?})", data);
        }
        Observation::Effect { data, .. } => {
            tracing::debug!(target: "reloop-core::Cmd", "Cmd({:?})", data);
        }
        Observation::Failure {
            func,
            reason,
            handled: false,
            ..
        } => {
            tracing::error!(target: "reloop-core::Failure", func, "unhandled failure: {}", reason);
        }
        Observation::Failure {
            func,
            reason,
            handled: true,
            ..
        } => {
            tracing::warn!(target: "reloop-core::Failure", func, "handled failure: {}", reason);
        }
        Observation::Fault { error, .. } => {
            tracing::error!(target: "reloop-core::Fault", "{}", error);
        }
    })
}

/// Filter observer - include/exclude types
pub fn filter_observer<A>(
    wrapped: ObserverFn<A>,
    include_actions: bool,
    include_effects: bool,
    include_failures: bool,
) -> ObserverFn<A>
where
    A: 'static,
{
    Arc::new(move |observation: &Observation<A>| {
        let should_pass = match observation {
            Observation::Action { .. } => include_actions,
            Observation::Effect { .. } => include_effects,
            Observation::Failure { .. } | Observation::Fault { .. } => include_failures,
        };

        if should_pass {
            wrapped(observation);
        }
    })
}

/// Filter observer with custom predicate
pub fn filter_with<A, F>(wrapped: ObserverFn<A>, predicate: F) -> ObserverFn<A>
where
    A: 'static,
    F: Fn(&Observation<A>) -> bool + Send + Sync + 'static,
{
    Arc::new(move |observation: &Observation<A>| {
        if predicate(observation) {
            wrapped(observation);
        }
    })
}

/// Tee observer - call multiple observers
pub fn tee_observer<A>(observers: Vec<ObserverFn<A>>) -> ObserverFn<A>
where
    A: 'static,
{
    Arc::new(move |observation: &Observation<A>| {
        for observer in &observers {
            observer(observation);
        }
    })
}
