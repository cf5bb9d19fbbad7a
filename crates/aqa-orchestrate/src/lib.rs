//! The Execution Orchestrator: invokes the external executor
//! binary, parses its report, and narrates the invocation as a synthetic
//! event stream for live consumers.

mod error;
mod event;
mod locator;
mod orchestrator;
mod report;

pub use error::OrchestrateError;
pub use event::{events_for_report, ExecutionEvent};
pub use locator::locate_executor;
pub use orchestrator::{run_plan, RunOptions, RunnerResult, StepRunResult};
pub use report::{ExecutorReport, ReportPlanRef, ReportSummary, StepOutcome, StepStatus};
