//! Property-based tests for the command model.
//!
//! Commands are built from random trees of actions, synchronous and delayed
//! runs, maps and every kind of list, then executed and simulated side by side.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use reloop_core::{
    execute, Cmd, Deferred, Dispatch, Effects, Failure, ListOptions, StandIn,
};
use tokio::runtime::Builder;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Msg {
    Value(u32),
    Tagged(u32),
    Failed,
}

fn echo(n: u32) -> Result<u32, Failure> {
    Ok(n)
}

fn echo_later((n, ms): (u32, u64)) -> Deferred<u32> {
    Deferred::later(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok::<u32, Failure>(n)
    })
}

fn retag(msg: Msg) -> Msg {
    match msg {
        Msg::Value(n) | Msg::Tagged(n) => Msg::Tagged(n),
        Msg::Failed => Msg::Failed,
    }
}

/// Shape of a command tree; built into a command plus the stand-in that
/// mirrors what running it yields.
#[derive(Clone, Debug)]
enum Shape {
    None,
    Action(u32),
    Run(u32),
    Pending(u32, u64),
    Map(Box<Shape>),
    Plain(Vec<Shape>),
    Sequence(Vec<Shape>),
    Batch(Vec<Shape>),
    SequenceBatch(Vec<Shape>),
}

fn build_list(children: &[Shape], options: ListOptions) -> (Cmd<Msg>, StandIn) {
    let (cmds, stand_ins): (Vec<_>, Vec<_>) = children.iter().map(build).unzip();
    (Cmd::list_with(cmds, options), StandIn::list(stand_ins))
}

fn build(shape: &Shape) -> (Cmd<Msg>, StandIn) {
    match shape {
        Shape::None => (Cmd::None, StandIn::Empty),
        Shape::Action(n) => (Cmd::action(Msg::Value(*n)), StandIn::Empty),
        Shape::Run(n) => (
            Cmd::run(echo, *n)
                .on_success(Msg::Value)
                .on_failure(|_: Failure| Msg::Failed)
                .into(),
            StandIn::success(*n),
        ),
        Shape::Pending(n, ms) => (
            Cmd::run(echo_later, (*n, *ms))
                .on_success(Msg::Value)
                .on_failure(|_: Failure| Msg::Failed)
                .into(),
            StandIn::success(*n),
        ),
        Shape::Map(inner) => {
            let (cmd, stand_in) = build(inner);
            (Cmd::map(cmd, retag), stand_in)
        }
        Shape::Plain(children) => build_list(children, ListOptions::default()),
        Shape::Sequence(children) => build_list(
            children,
            ListOptions {
                sequence: true,
                batch: false,
            },
        ),
        Shape::Batch(children) => build_list(
            children,
            ListOptions {
                sequence: false,
                batch: true,
            },
        ),
        Shape::SequenceBatch(children) => build_list(
            children,
            ListOptions {
                sequence: true,
                batch: true,
            },
        ),
    }
}

fn leaf() -> impl Strategy<Value = Shape> {
    prop_oneof![
        Just(Shape::None),
        any::<u32>().prop_map(Shape::Action),
        any::<u32>().prop_map(Shape::Run),
        (any::<u32>(), 0u64..50).prop_map(|(n, ms)| Shape::Pending(n, ms)),
    ]
}

/// Any tree. Only the set of emitted actions is predictable: unordered lists
/// release in completion order and non-batch lists dispatch on their own.
fn shape() -> impl Strategy<Value = Shape> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        let children = || prop::collection::vec(inner.clone(), 0..4);
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Map(Box::new(s))),
            children().prop_map(Shape::Plain),
            children().prop_map(Shape::Sequence),
            children().prop_map(Shape::Batch),
            children().prop_map(Shape::SequenceBatch),
        ]
    })
}

/// Trees whose lists all hand back their actions in child order.
fn ordered_shape() -> impl Strategy<Value = Shape> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Map(Box::new(s))),
            prop::collection::vec(inner, 0..4).prop_map(Shape::SequenceBatch),
        ]
    })
}

/// Execute on a paused clock. Returns what the lists dispatched themselves,
/// followed by what the command handed back once settled.
fn run_all(cmd: &Cmd<Msg>) -> (Vec<Msg>, Vec<Msg>) {
    let rt = Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("tokio runtime");
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&dispatched);
    let effects = Effects::new(Dispatch::sink(move |msg: Msg| sink.lock().unwrap().push(msg)));
    let returned = rt.block_on(async {
        execute(cmd, &effects)
            .expect("no force_sync runs")
            .settle()
            .await
    });
    let dispatched = dispatched.lock().unwrap().clone();
    (dispatched, returned)
}

fn sorted(mut actions: Vec<Msg>) -> Vec<Msg> {
    actions.sort();
    actions
}

proptest! {
    #[test]
    fn simulation_agrees_with_execution(shape in ordered_shape()) {
        let (cmd, stand_in) = build(&shape);
        let (dispatched, returned) = run_all(&cmd);
        let simulated = cmd.simulate(stand_in).expect("mirrored stand-in");
        prop_assert!(dispatched.is_empty());
        prop_assert_eq!(returned, simulated);
    }

    #[test]
    fn simulation_covers_everything_execution_emits(shape in shape()) {
        let (cmd, stand_in) = build(&shape);
        let (dispatched, returned) = run_all(&cmd);
        let simulated = cmd.simulate(stand_in).expect("mirrored stand-in");
        let emitted: Vec<Msg> = dispatched.into_iter().chain(returned).collect();
        prop_assert_eq!(sorted(emitted), sorted(simulated));
    }

    #[test]
    fn rebuilt_commands_are_equal_and_run_the_same(shape in shape()) {
        let (first, _) = build(&shape);
        let (second, _) = build(&shape);
        prop_assert_eq!(&first, &second);
        let (first_dispatched, first_returned) = run_all(&first);
        let (second_dispatched, second_returned) = run_all(&second.clone());
        prop_assert_eq!(sorted(first_dispatched), sorted(second_dispatched));
        prop_assert_eq!(sorted(first_returned), sorted(second_returned));
    }

    #[test]
    fn map_preserves_count_and_order(values in prop::collection::vec(any::<u32>(), 0..8)) {
        let cmd = Cmd::batch(values.iter().map(|n| Cmd::action(Msg::Value(*n))));
        let tagged: Vec<Msg> = run_all(&Cmd::map(cmd, retag)).1;
        let expected: Vec<Msg> = values.iter().map(|n| Msg::Tagged(*n)).collect();
        prop_assert_eq!(tagged, expected);
    }

    #[test]
    fn failures_map_through_the_fail_constructor(n in any::<u32>()) {
        let cmd: Cmd<Msg> = Cmd::run(echo, n)
            .on_success(Msg::Value)
            .on_failure(|_: Failure| Msg::Failed)
            .into();
        let actions = cmd.simulate(StandIn::failure(Failure::msg("nope"))).expect("simulate");
        prop_assert_eq!(actions, vec![Msg::Failed]);
    }
}
