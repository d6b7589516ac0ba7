use serde::{Deserialize, Serialize};

/// Store options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Skip reporting run failures that a fail-action constructor already
    /// turned into an action. Unhandled failures are always reported.
    #[serde(alias = "suppressLogOnHandledFailure")]
    pub suppress_log_on_handled_failure: bool,
}

impl Config {
    pub fn suppress_log_on_handled_failure(mut self, suppress: bool) -> Self {
        self.suppress_log_on_handled_failure = suppress;
        self
    }
}
