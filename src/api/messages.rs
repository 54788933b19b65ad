//! The message protocol between a caller and a simulation worker.
//!
//! Requests carry every run parameter; replies are either the complete result
//! (with the path count that was actually simulated) or a single error text.

use serde::{Deserialize, Serialize};

use super::payload::RunParams;
use crate::core::SimulationResult;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerRequest {
    Run {
        #[serde(default)]
        params: RunParams,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "result")]
    Completed {
        sims: usize,
        result: Box<SimulationResult>,
    },
    #[serde(rename = "error")]
    Failed { error: String },
}

impl WorkerMessage {
    pub fn completed(result: SimulationResult) -> Self {
        WorkerMessage::Completed {
            sims: result.ending_cash.len(),
            result: Box::new(result),
        }
    }

    pub fn failed(err: &impl std::fmt::Display) -> Self {
        WorkerMessage::Failed {
            error: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Metrics, QuantileBands, TornadoResult};

    fn tiny_result() -> SimulationResult {
        SimulationResult {
            timeline: vec![1, 2, 3],
            bands: QuantileBands {
                p5: vec![1.0; 3],
                p25: vec![2.0; 3],
                p50: vec![3.0; 3],
                p75: vec![4.0; 3],
                p95: vec![5.0; 3],
            },
            ending_cash: vec![10.0, 20.0],
            metrics: Metrics {
                p_shortfall_any: 0.5,
                p_end_cash_neg: 0.0,
                var5: 10.5,
                median_end: 15.0,
                mean_end: 15.0,
            },
            tornado: TornadoResult {
                base: 0.5,
                items: Vec::new(),
            },
            seed: 7,
        }
    }

    #[test]
    fn run_request_parses_tagged_message() {
        let request: WorkerRequest = serde_json::from_str(
            r#"{"type": "run", "params": {"periods": 6, "demand": {"dist": "poisson", "mu": 4}}}"#,
        )
        .expect("run message parses");
        let WorkerRequest::Run { params } = request;
        assert_eq!(params.periods, Some(6.0));
        assert_eq!(params.demand.dist.as_deref(), Some("poisson"));
        assert_eq!(params.demand.mu, Some(4.0));
        assert_eq!(params.demand.sigma, None);
    }

    #[test]
    fn run_request_without_params_uses_defaults() {
        let request: WorkerRequest =
            serde_json::from_str(r#"{"type": "run"}"#).expect("bare run message parses");
        let WorkerRequest::Run { params } = request;
        assert_eq!(params.sims, None);
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        assert!(serde_json::from_str::<WorkerRequest>(r#"{"type": "cancel"}"#).is_err());
    }

    #[test]
    fn completed_message_serializes_result_keys() {
        let json = serde_json::to_string(&WorkerMessage::completed(tiny_result()))
            .expect("message serializes");
        assert!(json.starts_with(r#"{"type":"result","sims":2,"result":{"#));
        for key in [
            "\"timeline\"",
            "\"bands\"",
            "\"p95\"",
            "\"endingCash\"",
            "\"pShortfallAny\"",
            "\"pEndCashNeg\"",
            "\"var5\"",
            "\"medianEnd\"",
            "\"meanEnd\"",
            "\"tornado\"",
            "\"seed\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn failed_message_carries_text() {
        let json = serde_json::to_string(&WorkerMessage::failed(&"boom")).expect("serializes");
        assert_eq!(json, r#"{"type":"error","error":"boom"}"#);
    }
}
