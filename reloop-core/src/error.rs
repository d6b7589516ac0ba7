use thiserror::Error;

/// Errors that escape to the caller. Effect failures never show up here; they
/// become actions or observations (see [`crate::Failure`]).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("`{func}` is marked force_sync but its result was still pending")]
    ForceSync { func: &'static str },

    #[error("the store runtime is no longer running")]
    Closed,
}

/// The stand-ins handed to a simulation do not fit the command being simulated.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("{cmd} command expects a {expected} stand-in, got {found}")]
    Shape {
        cmd: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("list holds {expected} commands but {found} stand-ins were supplied")]
    Length { expected: usize, found: usize },

    #[error("stand-in result for `{func}` is not a `{expected}`")]
    ResultType {
        func: &'static str,
        expected: &'static str,
    },
}
