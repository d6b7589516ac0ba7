// Simulation must agree with the runner, without running anything.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reloop_core::{
    execute, simulate, Cmd, Dispatch, Effects, Execution, Failure, SimulationError, StandIn,
};

#[derive(Clone, Debug, PartialEq)]
enum Msg {
    Loaded(String),
    Failed(String),
    Child(Child),
    Tick,
}

#[derive(Clone, Debug, PartialEq)]
enum Child {
    Done(u32),
}

static CALLS: AtomicUsize = AtomicUsize::new(0);

fn load(id: u32) -> Result<String, Failure> {
    Ok(format!("user-{id}"))
}

fn tracked(id: u32) -> Result<String, Failure> {
    CALLS.fetch_add(1, Ordering::SeqCst);
    Ok(format!("user-{id}"))
}

fn count(n: u32) -> Result<u32, Failure> {
    Ok(n)
}

fn load_cmd(id: u32) -> Cmd<Msg> {
    Cmd::run(load, id)
        .on_success(Msg::Loaded)
        .on_failure(|reason: Failure| Msg::Failed(reason.to_string()))
        .into()
}

#[test]
fn simulated_run_never_calls_the_function() {
    let cmd: Cmd<Msg> = Cmd::run(tracked, 1)
        .on_success(Msg::Loaded)
        .on_failure(|reason: Failure| Msg::Failed(reason.to_string()))
        .into();

    let actions = cmd
        .simulate(StandIn::success("ada".to_string()))
        .expect("simulate");
    assert_eq!(actions, vec![Msg::Loaded("ada".to_string())]);

    let actions = simulate(&cmd, StandIn::failure(Failure::msg("gone"))).expect("simulate");
    assert_eq!(actions, vec![Msg::Failed("gone".to_string())]);
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

#[test]
fn simulation_matches_execution() {
    let child: Cmd<Child> = Cmd::run(count, 3).on_success(Child::Done).into();
    let cmd = Cmd::batch(vec![load_cmd(7), Cmd::action(Msg::Tick), child.tag(Msg::Child)]);

    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&dispatched);
    let effects = Effects::new(Dispatch::sink(move |msg| sink.lock().unwrap().push(msg)));
    let executed = match execute(&cmd, &effects).expect("execute") {
        Execution::Ready(actions) => actions,
        Execution::Pending(_) => panic!("all children are synchronous"),
    };

    let simulated = cmd
        .simulate(StandIn::list([
            StandIn::success("user-7".to_string()),
            StandIn::Empty,
            StandIn::success(3u32),
        ]))
        .expect("simulate");
    assert_eq!(simulated, executed);
    assert_eq!(
        simulated,
        vec![
            Msg::Loaded("user-7".to_string()),
            Msg::Tick,
            Msg::Child(Child::Done(3)),
        ]
    );
    assert!(dispatched.lock().unwrap().is_empty());
}

#[test]
fn none_and_action_take_empty_stand_ins() {
    assert_eq!(simulate(&Cmd::<Msg>::None, StandIn::Empty), Ok(Vec::new()));
    assert_eq!(
        simulate(&Cmd::action(Msg::Tick), StandIn::Empty),
        Ok(vec![Msg::Tick])
    );
}

#[test]
fn mismatched_shape_is_an_error() {
    let err = load_cmd(1).simulate(StandIn::Empty).unwrap_err();
    assert_eq!(
        err,
        SimulationError::Shape {
            cmd: "run",
            expected: "success or failure",
            found: "empty",
        }
    );

    let err = Cmd::list(vec![load_cmd(1)])
        .simulate(StandIn::success(1u32))
        .unwrap_err();
    assert!(matches!(err, SimulationError::Shape { cmd: "list", .. }));
}

#[test]
fn list_length_must_match() {
    let err = Cmd::list(vec![load_cmd(1), load_cmd(2)])
        .simulate(StandIn::list([StandIn::success("a".to_string())]))
        .unwrap_err();
    assert_eq!(
        err,
        SimulationError::Length {
            expected: 2,
            found: 1
        }
    );
}

#[test]
fn wrong_result_type_is_an_error() {
    let err = load_cmd(1).simulate(StandIn::success(5u32)).unwrap_err();
    match err {
        SimulationError::ResultType { func, expected } => {
            assert!(func.contains("load"));
            assert!(expected.contains("String"));
        }
        other => panic!("expected a result type error, got {other:?}"),
    }
}
