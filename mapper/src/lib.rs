//! Per-sample dataset mapping for multi-dataset detection training.
//!
//! [DatasetMapper] turns a [DatasetRecord] into a [Sample]: it reads the
//! image, runs the augmentation pipeline selected for the record's dataset,
//! remaps the annotations through the sampled transforms and assembles the
//! ground truth.

mod common;

pub mod augmentation;
pub mod config;
pub mod image_io;
pub mod mapper;
pub mod policy;
pub mod proposals;
pub mod record;
pub mod remap;
pub mod sample;

pub use image_io::{DiskImageReader, ImageFormat, ImageReader};
pub use mapper::*;
pub use policy::*;
pub use proposals::Proposals;
pub use record::*;
pub use sample::*;
