//! Object annotations and per-image instance collections.

mod common;

pub mod annotation;
pub mod instances;
pub mod keypoints;
pub mod mask;
pub mod polygon;
pub mod rle;

pub use annotation::*;
pub use instances::*;
pub use keypoints::*;
pub use mask::*;
pub use rle::Rle;
