//! Geometric and photometric augmentations that record the concrete
//! transform they apply, so that annotations can follow the image.

mod common;

pub mod aug_input;
pub mod augmentation;
pub mod crop;
pub mod flip;
pub mod image_ops;
pub mod photometric;
pub mod resize;
pub mod transform;

pub use aug_input::*;
pub use augmentation::*;
pub use crop::*;
pub use flip::*;
pub use image_ops::{Image, Interp, LabelMap};
pub use photometric::*;
pub use resize::*;
pub use transform::*;
