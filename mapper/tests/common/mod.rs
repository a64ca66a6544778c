#![allow(dead_code)]

use anyhow::Result;
use image::{GrayImage, Luma, Rgb, RgbImage};
use mapper::{config::Config, DatasetRecord};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const IMAGE_H: u32 = 32;
pub const IMAGE_W: u32 = 48;

/// A temporary directory holding image fixtures.
pub struct Fixture {
    pub dir: TempDir,
    pub image_file: PathBuf,
    pub sem_seg_file: PathBuf,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;

        let image_file = dir.path().join("image.png");
        RgbImage::from_fn(IMAGE_W, IMAGE_H, |x, y| {
            Rgb([(x * 5) as u8, (y * 7) as u8, 128])
        })
        .save(&image_file)?;

        let sem_seg_file = dir.path().join("sem_seg.png");
        GrayImage::from_fn(IMAGE_W, IMAGE_H, |x, _| Luma([if x < IMAGE_W / 2 { 1 } else { 2 }]))
            .save(&sem_seg_file)?;

        Ok(Self {
            dir,
            image_file,
            sem_seg_file,
        })
    }

    /// Parse a record, filling in the image file name.
    pub fn record(&self, mut fields: Value) -> Result<DatasetRecord> {
        fields["file_name"] = Value::String(path_str(&self.image_file));
        let record = serde_json::from_value(fields)?;
        Ok(record)
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// A configuration whose default pipeline keeps the fixture size and never
/// flips. `input` and `rest` are spliced into the `input` section and the
/// top level.
pub fn identity_config(input: &str, rest: &str) -> Result<Config> {
    let text = format!(
        r#"{{
            input: {{
                min_size_train: [{h}],
                min_size_test: {h},
                random_flip: "none",
                {input}
            }},
            {rest}
        }}"#,
        h = IMAGE_H,
        input = input,
        rest = rest,
    );
    let config = json5::from_str(&text)?;
    Ok(config)
}
