//! The per-object annotation schema of dataset records.

use crate::{common::*, polygon, BitMask, Rle};

/// One object instance in a dataset record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub bbox: [f64; 4],
    #[serde(default)]
    pub bbox_mode: BoxMode,
    pub category_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Segmentation>,
    /// Flat `[x, y, visibility]` triples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Vec<f64>>,
    #[serde(default, deserialize_with = "deserialize_iscrowd")]
    pub iscrowd: bool,
}

impl Annotation {
    /// The box in absolute pixel units.
    pub fn rect(&self) -> Result<TLBR<f64>> {
        self.bbox_mode
            .to_tlbr(self.bbox)
            .with_context(|| format!("invalid bbox {:?}", self.bbox))
    }
}

/// Instance segmentation in one of the COCO forms, or a decoded mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segmentation {
    /// Flat `[x, y, x, y, ...]` polygons.
    Polygons(Vec<Vec<f64>>),
    Rle(Rle),
    /// A decoded mask. Produced by geometric remapping, never read from files.
    #[serde(skip)]
    Bitmask(BitMask),
}

impl Segmentation {
    /// Check coordinate lists and run lengths for well-formedness.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Polygons(polygons) => polygons.iter().try_for_each(|p| polygon::validate(p)),
            Self::Rle(rle) => rle.decode().map(|_| ()),
            Self::Bitmask(_) => Ok(()),
        }
    }
}

fn deserialize_iscrowd<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IsCrowd {
        Bool(bool),
        Int(u8),
    }

    match IsCrowd::deserialize(deserializer)? {
        IsCrowd::Bool(flag) => Ok(flag),
        IsCrowd::Int(flag) => Ok(flag != 0),
    }
}
