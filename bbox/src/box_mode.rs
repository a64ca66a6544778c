//! Box coordinate conventions.

use crate::{common::*, TLBR};
use std::fmt;

/// The coordinate convention of a stored box.
///
/// It is serialized as the integer code used by COCO-style dataset dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BoxMode {
    /// `[x0, y0, x1, y1]` in pixels.
    XyxyAbs,
    /// `[x0, y0, w, h]` in pixels.
    XywhAbs,
    /// `[x0, y0, x1, y1]` in ratios of the image size.
    XyxyRel,
    /// `[x0, y0, w, h]` in ratios of the image size.
    XywhRel,
    /// `[xc, yc, w, h, angle]` rotated boxes.
    XywhaAbs,
}

impl BoxMode {
    /// Convert `coords` in this mode into an absolute box.
    pub fn to_tlbr(self, coords: [f64; 4]) -> Result<TLBR<f64>> {
        let [a, b, c, d] = coords;
        ensure!(
            coords.iter().all(|val| val.is_finite()),
            "box coordinates must be finite, but get {:?}",
            coords
        );

        match self {
            Self::XyxyAbs => TLBR::try_from_xyxy([a, b, c, d]),
            Self::XywhAbs => TLBR::try_from_xyxy([a, b, a + c, b + d]),
            Self::XyxyRel | Self::XywhRel => {
                bail!("relative box mode {} is not supported", self)
            }
            Self::XywhaAbs => bail!("rotated box mode {} is not supported", self),
        }
    }
}

impl Default for BoxMode {
    fn default() -> Self {
        Self::XyxyAbs
    }
}

impl TryFrom<u8> for BoxMode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let mode = match code {
            0 => Self::XyxyAbs,
            1 => Self::XywhAbs,
            2 => Self::XyxyRel,
            3 => Self::XywhRel,
            4 => Self::XywhaAbs,
            _ => return Err(format!("invalid box mode code {}", code)),
        };
        Ok(mode)
    }
}

impl From<BoxMode> for u8 {
    fn from(mode: BoxMode) -> Self {
        match mode {
            BoxMode::XyxyAbs => 0,
            BoxMode::XywhAbs => 1,
            BoxMode::XyxyRel => 2,
            BoxMode::XywhRel => 3,
            BoxMode::XywhaAbs => 4,
        }
    }
}

impl fmt::Display for BoxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::XyxyAbs => "XYXY_ABS",
            Self::XywhAbs => "XYWH_ABS",
            Self::XyxyRel => "XYXY_REL",
            Self::XywhRel => "XYWH_REL",
            Self::XywhaAbs => "XYWHA_ABS",
        };
        write!(f, "{}", name)
    }
}
