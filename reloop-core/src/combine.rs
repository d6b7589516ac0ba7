use crate::{lift_state, Cmd, Loop, Reduction};

/// Combine commands into one, dropping `None`s. A single survivor is returned
/// as is; several become an unordered list.
pub fn merge<A>(cmds: impl IntoIterator<Item = Cmd<A>>) -> Cmd<A> {
    let mut cmds: Vec<Cmd<A>> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
    match cmds.len() {
        0 => Cmd::None,
        1 => cmds.pop().unwrap_or_default(),
        _ => Cmd::list(cmds),
    }
}

pub type BoxReducer<S, A> = Box<dyn Fn(&S, A) -> Loop<S, A> + Send + Sync>;

/// Box a reducer returning either state or a loop.
pub fn boxed<S, A, F, R>(reducer: F) -> BoxReducer<S, A>
where
    F: Fn(&S, A) -> R + Send + Sync + 'static,
    R: Into<Reduction<S, A>>,
{
    Box::new(move |state: &S, action: A| lift_state(reducer(state, action)))
}

/// Run `reducers` one after another over the same action, each seeing the
/// state the previous one returned. Their commands are merged in order.
pub fn reduce_reducers<S, A>(reducers: Vec<BoxReducer<S, A>>) -> impl Fn(&S, A) -> Loop<S, A>
where
    S: Clone,
    A: Clone,
{
    move |state: &S, action: A| {
        let mut cmds = Vec::with_capacity(reducers.len());
        let mut reducers = reducers.iter();
        let mut current = match reducers.next() {
            Some(first) => {
                let (next, cmd) = first(state, action.clone()).into_parts();
                cmds.push(cmd);
                next
            }
            None => return Loop::new(state.clone(), Cmd::None),
        };
        for reducer in reducers {
            let (next, cmd) = reducer(&current, action.clone()).into_parts();
            cmds.push(cmd);
            current = next;
        }
        Loop::new(current, merge(cmds))
    }
}

/// One field of a parent state and the reducer that owns it.
pub struct Child<S, A> {
    apply: Box<dyn Fn(&mut S, A) -> Cmd<A> + Send + Sync>,
}

/// Lens `get`/`set` into a field of `S`, reduced by `reducer`.
pub fn child<S, A, C, F, R>(
    get: impl Fn(&S) -> &C + Send + Sync + 'static,
    set: impl Fn(&mut S, C) + Send + Sync + 'static,
    reducer: F,
) -> Child<S, A>
where
    F: Fn(&C, A) -> R + Send + Sync + 'static,
    R: Into<Reduction<C, A>>,
{
    Child {
        apply: Box::new(move |parent: &mut S, action: A| {
            let (field, cmd) = lift_state(reducer(get(parent), action)).into_parts();
            set(parent, field);
            cmd
        }),
    }
}

/// Apply each child reducer to its field of the parent's result. The parent's
/// own command comes first, then the children's in the order given.
pub fn merge_child_reducers<S, A>(
    parent: impl Into<Reduction<S, A>>,
    action: A,
    children: &[Child<S, A>],
) -> Loop<S, A>
where
    A: Clone,
{
    let (mut state, parent_cmd) = lift_state(parent).into_parts();
    let mut cmds = Vec::with_capacity(children.len() + 1);
    cmds.push(parent_cmd);
    for child in children {
        cmds.push((child.apply)(&mut state, action.clone()));
    }
    Loop::new(state, merge(cmds))
}
