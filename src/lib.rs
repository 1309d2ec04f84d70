//! Food photo calorie estimation service.
//!
//! Uploaded photos go through a black-box object detector (YOLO on Triton);
//! food detections are matched against ordered calorie tables, drawn onto a
//! copy of the photo, and summed into a total.

pub mod calorie;
pub mod config;
pub mod detector;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod storage;
pub mod triton;
pub mod views;
