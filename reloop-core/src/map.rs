use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::cmd::Cmd;
use crate::effects::Effects;
use crate::run::FnId;
use crate::runner::{execute, Aborted, Execution};
use crate::simulate::{simulate, StandIn};
use crate::SimulationError;

/// A command over some other action type, seen from the outside.
pub(crate) trait Nested<A>: Send + Sync + 'static {
    fn execute(&self, effects: &Effects<A>) -> Result<Execution<A>, Aborted<A>>;

    fn simulate(&self, stand_in: StandIn) -> Result<Vec<A>, SimulationError>;

    fn same(&self, other: &dyn Nested<A>) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

type Tagger<X, B, A> = Arc<dyn Fn(&X, B) -> A + Send + Sync>;

pub(crate) struct Tagged<B, A, X> {
    inner: Cmd<B>,
    tag_id: FnId,
    tag: Tagger<X, B, A>,
    extra: Arc<X>,
}

impl<B, A, X> Tagged<B, A, X> {
    pub(crate) fn new(inner: Cmd<B>, tag_id: FnId, tag: Tagger<X, B, A>, extra: X) -> Self {
        Tagged {
            inner,
            tag_id,
            tag,
            extra: Arc::new(extra),
        }
    }
}

impl<B, A, X> Tagged<B, A, X>
where
    B: 'static,
    A: 'static,
    X: Send + Sync + 'static,
{
    fn tagger(&self) -> Arc<dyn Fn(B) -> A + Send + Sync> {
        let tag = Arc::clone(&self.tag);
        let extra = Arc::clone(&self.extra);
        Arc::new(move |action| tag(&extra, action))
    }
}

impl<B, A, X> Nested<A> for Tagged<B, A, X>
where
    B: Clone + PartialEq + Debug + Send + Sync + 'static,
    A: Send + 'static,
    X: PartialEq + Debug + Send + Sync + 'static,
{
    fn execute(&self, effects: &Effects<A>) -> Result<Execution<A>, Aborted<A>> {
        let tag = self.tagger();
        // Actions the inner command dispatches itself are tagged on the way out too.
        let inner_effects = effects.tagged(Arc::clone(&tag));
        match execute(&self.inner, &inner_effects) {
            Ok(started) => Ok(started.map(move |action| tag(action))),
            Err(aborted) => Err(aborted.map(move |action| tag(action))),
        }
    }

    fn simulate(&self, stand_in: StandIn) -> Result<Vec<A>, SimulationError> {
        Ok(simulate(&self.inner, stand_in)?
            .into_iter()
            .map(|action| (self.tag)(&self.extra, action))
            .collect())
    }

    fn same(&self, other: &dyn Nested<A>) -> bool {
        other.as_any().downcast_ref::<Self>().is_some_and(|other| {
            self.tag_id.same(&self.tag, &other.tag_id, &other.tag)
                && self.extra == other.extra
                && self.inner == other.inner
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("cmd", &self.inner)
            .field("tag", &self.tag_id.name())
            .field("extra", &*self.extra)
            .finish()
    }
}
