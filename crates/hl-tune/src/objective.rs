//! The objective-function contract evaluated once per trial.

use async_trait::async_trait;
use hl_types::{HlResult, ParamMap};
use std::future::Future;
use std::pin::Pin;

use crate::report::Reporter;

/// A black-box objective: evaluates one resolved configuration, streaming
/// intermediate metrics through the [`Reporter`]. May be arbitrarily slow;
/// must have no side effects beyond computing and reporting scalars.
#[async_trait]
pub trait Objective: Send + Sync {
    async fn run(&self, config: ParamMap, reporter: Reporter) -> HlResult<()>;
}

type BoxedObjectiveFn = Box<
    dyn Fn(ParamMap, Reporter) -> Pin<Box<dyn Future<Output = HlResult<()>> + Send>>
        + Send
        + Sync,
>;

/// Adapter so plain async closures can serve as objectives.
pub struct ObjectiveFn {
    f: BoxedObjectiveFn,
}

impl ObjectiveFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ParamMap, Reporter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HlResult<()>> + Send + 'static,
    {
        Self {
            f: Box::new(move |config, reporter| Box::pin(f(config, reporter))),
        }
    }
}

#[async_trait]
impl Objective for ObjectiveFn {
    async fn run(&self, config: ParamMap, reporter: Reporter) -> HlResult<()> {
        (self.f)(config, reporter).await
    }
}
