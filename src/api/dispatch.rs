use tracing::debug;

use super::error::{ApiError, ApiResult};
use super::messages::{WorkerMessage, WorkerRequest};
use super::payload::{RunArgs, run_args_from_payload};
use crate::core::{RunConfig, SimulationParameters, SimulationResult, run_with};

/// Where a run executes. Both strategies call the same core entry point.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Execution {
    /// On the caller's task.
    Inline,
    /// On tokio's blocking pool, keeping the async executor responsive.
    Offloaded,
}

impl Execution {
    pub async fn run(self, args: RunArgs) -> ApiResult<SimulationResult> {
        let params = SimulationParameters::from_inputs(&args.inputs());
        let config = args.run_config();
        debug!(execution = ?self, paths = params.path_count, "dispatching run");
        match self {
            Execution::Inline => Ok(run_with(&params, &config)?),
            Execution::Offloaded => offload(params, config).await,
        }
    }
}

async fn offload(params: SimulationParameters, config: RunConfig) -> ApiResult<SimulationResult> {
    let outcome = tokio::task::spawn_blocking(move || run_with(&params, &config))
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))?;
    Ok(outcome?)
}

/// Answers a worker request. A failure maps to the `error` reply through
/// [`WorkerMessage::failed`].
pub async fn dispatch(request: WorkerRequest, execution: Execution) -> ApiResult<WorkerMessage> {
    let WorkerRequest::Run { params } = request;
    let result = execution.run(run_args_from_payload(params.into())).await?;
    Ok(WorkerMessage::completed(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_args() -> RunArgs {
        RunArgs {
            sims: 1_000.0,
            seed: Some(42),
            sensitivity_sims: 200,
            ..RunArgs::default()
        }
    }

    #[tokio::test]
    async fn inline_and_offloaded_runs_agree() {
        let inline = Execution::Inline.run(quick_args()).await.expect("inline run");
        let offloaded = Execution::Offloaded
            .run(quick_args())
            .await
            .expect("offloaded run");
        assert_eq!(inline, offloaded);
    }

    #[tokio::test]
    async fn dispatch_echoes_clamped_path_count() {
        let request: WorkerRequest = serde_json::from_str(
            r#"{"type": "run", "params": {"sims": 10, "seed": 5, "periods": 3}}"#,
        )
        .expect("request parses");
        match dispatch(request, Execution::Inline).await.expect("run succeeds") {
            WorkerMessage::Completed { sims, result } => {
                assert_eq!(sims, 1_000);
                assert_eq!(result.timeline, vec![1, 2, 3]);
                assert_eq!(result.seed, 5);
            }
            WorkerMessage::Failed { error } => panic!("unexpected failure: {error}"),
        }
    }

    #[tokio::test]
    async fn dispatch_surfaces_core_failure_as_one_error() {
        let request: WorkerRequest = serde_json::from_str(
            r#"{"type": "run", "params": {"aov": 1e308, "demand": {"mu": 1e12}}}"#,
        )
        .expect("request parses");
        let err = dispatch(request, Execution::Offloaded)
            .await
            .expect_err("overflowing run should fail");
        assert!(matches!(err, ApiError::Simulation(_)));
        match WorkerMessage::failed(&err) {
            WorkerMessage::Failed { error } => assert!(error.contains("non-finite")),
            WorkerMessage::Completed { .. } => unreachable!(),
        }
    }
}
