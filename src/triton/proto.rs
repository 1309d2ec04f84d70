//! Re-exports of generated Triton protobuf types.

// Generated by tonic-build from proto/inference.proto
pub mod inference {
    tonic::include_proto!("inference");
}

pub use inference::grpc_inference_service_client::GrpcInferenceServiceClient;
pub use inference::model_infer_request::{InferInputTensor, InferRequestedOutputTensor};
pub use inference::{InferTensorContents, ModelInferRequest, ModelInferResponse};
