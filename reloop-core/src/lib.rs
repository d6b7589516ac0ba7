mod cmd;
mod combine;
mod config;
mod deferred;
mod effects;
mod error;
mod failure;
mod looped;
mod map;
mod observation;
mod observer;
mod run;
mod runner;
mod simulate;
mod store;

pub use cmd::{Cmd, ListCmd, ListOptions, MapCmd, RunCmd};
pub use combine::{boxed, child, merge, merge_child_reducers, reduce_reducers, BoxReducer, Child};
pub use config::Config;
pub use deferred::{Deferred, IntoDeferred};
pub use effects::{Dispatch, Dispatched, Effects};
pub use error::{Error, SimulationError};
pub use failure::Failure;
pub use looped::{get_cmd, get_model, is_loop, lift_state, loop_, Loop, Reduction};
pub use observation::Observation;
pub use observer::{
    filter_observer, filter_with, no_op_observer, tee_observer, tracing_observer, ObserverFn,
};
pub use run::{Run, RunArgs};
pub use runner::{execute, Aborted, Execution};
pub use simulate::{simulate, StandIn};
pub use store::{create_store, install, Runtime, Store};
