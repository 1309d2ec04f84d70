//! Triton gRPC client with connection pooling and retry logic.
//!
//! Channel options:
//! - keepalive 30s
//! - 100MB stream windows
//! - 60s per-call transport timeout

use super::proto::*;
use crate::error::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::warn;

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 100;
const RETRY_MAX_DELAY_MS: u64 = 5000;

#[derive(Clone)]
pub struct TritonClient {
    channels: Arc<Vec<Channel>>,
    next_channel: Arc<AtomicUsize>,
    model_name: String,
}

impl TritonClient {
    /// Build the channel pool. Channels connect lazily, so an unreachable
    /// server surfaces as a detector error on the first request instead of
    /// blocking startup.
    pub fn new(triton_url: &str, pool_size: usize, model_name: &str) -> Result<Self, AppError> {
        let mut channels = Vec::with_capacity(pool_size.max(1));

        for _ in 0..pool_size.max(1) {
            let endpoint = Endpoint::from_shared(format!("http://{triton_url}"))
                .map_err(|e| AppError::Config(format!("Invalid Triton URL: {e}")))?
                .keep_alive_timeout(Duration::from_secs(30))
                .http2_keep_alive_interval(Duration::from_secs(30))
                .tcp_keepalive(Some(Duration::from_secs(30)))
                .initial_stream_window_size(Some(100 * 1024 * 1024)) // 100MB
                .initial_connection_window_size(Some(100 * 1024 * 1024))
                .timeout(Duration::from_secs(60))
                .concurrency_limit(1000);

            channels.push(endpoint.connect_lazy());
        }

        Ok(Self {
            channels: Arc::new(channels),
            next_channel: Arc::new(AtomicUsize::new(0)),
            model_name: model_name.to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Get next channel using round-robin.
    fn get_channel(&self) -> Channel {
        let idx = self.next_channel.fetch_add(1, Ordering::Relaxed) % self.channels.len();
        self.channels[idx].clone()
    }

    /// Infer a YOLO End2End model (NMS inside the graph).
    ///
    /// Input: images [N, 3, S, S] FP32
    /// Outputs: num_dets [N, 1] INT32, det_boxes [N, K, 4] FP32,
    ///          det_scores [N, K] FP32, det_classes [N, K] INT32
    pub async fn infer_yolo(
        &self,
        batch_tensor: &[f32],
        batch_size: usize,
        input_size: u32,
    ) -> Result<YoloResult, AppError> {
        let shape = vec![batch_size as i64, 3, input_size as i64, input_size as i64];

        let request = ModelInferRequest {
            model_name: self.model_name.clone(),
            model_version: String::new(),
            id: String::new(),
            parameters: Default::default(),
            inputs: vec![InferInputTensor {
                name: "images".to_string(),
                datatype: "FP32".to_string(),
                shape,
                parameters: Default::default(),
                contents: Some(InferTensorContents {
                    fp32_contents: batch_tensor.to_vec(),
                    ..Default::default()
                }),
            }],
            outputs: ["num_dets", "det_boxes", "det_scores", "det_classes"]
                .into_iter()
                .map(|name| InferRequestedOutputTensor {
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let response = self.infer_with_retry(request).await?;

        Ok(YoloResult {
            num_dets: output_i32(&response, "num_dets")?,
            boxes: output_f32(&response, "det_boxes")?,
            scores: output_f32(&response, "det_scores")?,
            classes: output_i32(&response, "det_classes")?,
        })
    }

    /// Execute inference with exponential backoff retry.
    async fn infer_with_retry(
        &self,
        request: ModelInferRequest,
    ) -> Result<ModelInferResponse, AppError> {
        let mut delay_ms = RETRY_BASE_DELAY_MS;

        for attempt in 0..MAX_RETRIES {
            let channel = self.get_channel();
            let mut client = GrpcInferenceServiceClient::new(channel);

            match client.model_infer(request.clone()).await {
                Ok(response) => return Ok(response.into_inner()),
                Err(e) => {
                    let code = e.code();
                    let retryable =
                        code == tonic::Code::Unavailable || code == tonic::Code::ResourceExhausted;
                    if retryable && attempt < MAX_RETRIES - 1 {
                        warn!(attempt, delay_ms, "Triton unavailable, retrying: {}", e.message());
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(RETRY_MAX_DELAY_MS);
                        continue;
                    }
                    return Err(AppError::Detector(format!("Inference failed: {e}")));
                }
            }
        }

        Err(AppError::Detector("Max retries exceeded".to_string()))
    }
}

pub struct YoloResult {
    pub num_dets: Vec<i32>, // [N, 1] flattened
    pub boxes: Vec<f32>,    // [N, K, 4] flattened
    pub scores: Vec<f32>,   // [N, K] flattened
    pub classes: Vec<i32>,  // [N, K] flattened
}

/// Locate an output by name. Raw contents, when present, line up with
/// `outputs` by index.
fn find_output<'a>(
    response: &'a ModelInferResponse,
    name: &str,
) -> Result<(usize, &'a inference::model_infer_response::InferOutputTensor), AppError> {
    response
        .outputs
        .iter()
        .enumerate()
        .find(|(_, o)| o.name == name)
        .ok_or_else(|| AppError::Detector(format!("{name} output missing")))
}

fn output_f32(response: &ModelInferResponse, name: &str) -> Result<Vec<f32>, AppError> {
    let (idx, tensor) = find_output(response, name)?;
    if let Some(raw) = response.raw_output_contents.get(idx) {
        return Ok(bytemuck::allocation::pod_collect_to_vec::<u8, f32>(raw));
    }
    tensor
        .contents
        .as_ref()
        .map(|c| c.fp32_contents.clone())
        .ok_or_else(|| AppError::Detector(format!("{name} contents missing")))
}

fn output_i32(response: &ModelInferResponse, name: &str) -> Result<Vec<i32>, AppError> {
    let (idx, tensor) = find_output(response, name)?;
    if let Some(raw) = response.raw_output_contents.get(idx) {
        return Ok(bytemuck::allocation::pod_collect_to_vec::<u8, i32>(raw));
    }
    tensor
        .contents
        .as_ref()
        .map(|c| c.int_contents.clone())
        .ok_or_else(|| AppError::Detector(format!("{name} contents missing")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference::model_infer_response::InferOutputTensor;

    fn output(name: &str, contents: Option<InferTensorContents>) -> InferOutputTensor {
        InferOutputTensor {
            name: name.to_string(),
            contents,
            ..Default::default()
        }
    }

    #[test]
    fn raw_contents_are_matched_by_output_position() {
        let scores: Vec<u8> = [0.5f32, 0.25].iter().flat_map(|v| v.to_le_bytes()).collect();
        let count: Vec<u8> = 2i32.to_le_bytes().to_vec();
        let response = ModelInferResponse {
            outputs: vec![output("det_scores", None), output("num_dets", None)],
            raw_output_contents: vec![scores, count],
            ..Default::default()
        };

        assert_eq!(output_f32(&response, "det_scores").unwrap(), vec![0.5, 0.25]);
        assert_eq!(output_i32(&response, "num_dets").unwrap(), vec![2]);
    }

    #[test]
    fn typed_contents_are_used_without_raw_buffers() {
        let response = ModelInferResponse {
            outputs: vec![output(
                "det_classes",
                Some(InferTensorContents {
                    int_contents: vec![53, 46],
                    ..Default::default()
                }),
            )],
            ..Default::default()
        };

        assert_eq!(output_i32(&response, "det_classes").unwrap(), vec![53, 46]);
        assert!(matches!(
            output_f32(&response, "det_boxes"),
            Err(AppError::Detector(_))
        ));
    }

    #[tokio::test]
    async fn invalid_url_is_a_config_error() {
        let err = TritonClient::new("bad url with spaces", 1, "model").err();
        assert!(matches!(err, Some(AppError::Config(_))));
    }
}
