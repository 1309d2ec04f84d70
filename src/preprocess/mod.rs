pub mod decode;
pub mod yolo;
