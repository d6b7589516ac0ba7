//! Small application driven end to end by the integration tests: a counter,
//! a todo list loaded from a slow fake backend, and a title nobody reduces.

use std::sync::Arc;
use std::time::Duration;

use reloop_core::{install, loop_, Cmd, Config, Loop, ObserverFn};
use reloop_core_macros::CombineReducers;
use tokio::runtime::Builder;

#[derive(Clone, Debug, PartialEq)]
pub enum Msg {
    Increment,
    IncrementLater(u64),
    Load(u32),
    Loaded(Vec<String>),
    LoadFailed(String),
}

pub mod counter {
    use std::time::Duration;

    use reloop_core::{loop_, Cmd, Deferred, Failure, Reduction};

    use super::Msg;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Counter {
        pub value: i64,
    }

    pub fn delay(ms: u64) -> Deferred<()> {
        Deferred::later(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<(), Failure>(())
        })
    }

    pub fn reduce(state: &Counter, msg: Msg) -> Reduction<Counter, Msg> {
        match msg {
            Msg::Increment => Reduction::State(Counter {
                value: state.value + 1,
            }),
            Msg::IncrementLater(ms) => loop_(
                state.clone(),
                Cmd::run(delay, ms).on_success(|()| Msg::Increment),
            )
            .into(),
            _ => Reduction::State(state.clone()),
        }
    }
}

pub mod todos {
    use std::time::Duration;

    use reloop_core::{loop_, Cmd, Deferred, Failure, Reduction};

    use super::Msg;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Todos {
        pub items: Vec<String>,
        pub loading: bool,
        pub error: Option<String>,
    }

    /// Fake backend: answers after 50ms, refuses to load nothing.
    pub fn fetch(count: u32) -> Deferred<Vec<String>> {
        Deferred::later(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if count == 0 {
                return Err(Failure::msg("nothing to load"));
            }
            Ok((1..=count).map(|i| format!("todo #{i}")).collect())
        })
    }

    pub fn reduce(state: &Todos, msg: Msg) -> Reduction<Todos, Msg> {
        match msg {
            Msg::Load(count) => loop_(
                Todos {
                    loading: true,
                    ..state.clone()
                },
                Cmd::run(fetch, count)
                    .on_success(Msg::Loaded)
                    .on_failure(|reason: Failure| Msg::LoadFailed(reason.to_string())),
            )
            .into(),
            Msg::Loaded(items) => Reduction::State(Todos {
                items,
                loading: false,
                error: None,
            }),
            Msg::LoadFailed(reason) => Reduction::State(Todos {
                loading: false,
                error: Some(reason),
                ..state.clone()
            }),
            _ => Reduction::State(state.clone()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, CombineReducers)]
#[combine(action = Msg)]
pub struct AppState {
    #[reducer(counter::reduce)]
    pub counter: counter::Counter,
    #[reducer(todos::reduce)]
    pub todos: todos::Todos,
    pub title: String,
}

pub fn init() -> Loop<AppState, Msg> {
    let state = AppState {
        title: "mock".to_string(),
        ..AppState::default()
    };
    loop_(state, Cmd::action(Msg::Load(3)))
}

/// Run the app to completion: load the todos, bump the counter now and
/// later, then let the runtime drain.
pub fn run_app(observer: Option<ObserverFn<Msg>>) -> Arc<AppState> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let rt = Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime");

    let (store, runtime) = install(AppState::reduce, init(), Config::default());
    let runtime = match observer {
        Some(observer) => runtime.with_observer(observer),
        None => runtime,
    };

    rt.block_on(async move {
        let driver = tokio::spawn(runtime.run());
        store
            .dispatch(Msg::Increment)
            .await
            .expect("increment dispatched");
        let _ = store.dispatch(Msg::IncrementLater(10));
        drop(store);
        tokio::time::timeout(Duration::from_secs(1), driver)
            .await
            .expect("runtime should complete before timeout")
            .expect("runtime task")
    })
}
