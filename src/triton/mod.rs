//! Triton Inference Server backend for the detector boundary.

mod client;
mod detector;
pub mod proto;

pub use client::{TritonClient, YoloResult};
pub use detector::TritonDetector;
