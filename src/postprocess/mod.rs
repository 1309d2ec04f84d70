pub mod annotate;
pub mod coco_classes;
pub mod detection;
