// voyage/src/workflow/step.rs

use super::ContextData;
use std::sync::Arc;

/// Predicate evaluated before a step runs. `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(&ContextData<TData>) -> bool + Send + Sync + 'static>;

/// A named step of a pipeline.
///
/// An `optional` step is best-effort: a missing handler is skipped and a
/// handler error is logged and swallowed instead of failing the run.
#[derive(Clone)]
pub struct StepDef<TData: Send + Sync + 'static> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: Send + Sync + 'static> std::fmt::Debug for StepDef<TData> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
