//! Per-instance masks.

use crate::{common::*, polygon};

/// A binary `[h, w]` mask.
pub type BitMask = Array2<bool>;

/// The storage format of instance masks in [Instances](crate::Instances).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskFormat {
    Polygon,
    Bitmask,
}

impl Default for MaskFormat {
    fn default() -> Self {
        Self::Polygon
    }
}

/// Masks of all instances in an image.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceMasks {
    /// Each instance owns a list of flat `[x, y, x, y, ...]` polygons.
    Polygons(Vec<Vec<Vec<f64>>>),
    BitMasks(Vec<BitMask>),
}

impl InstanceMasks {
    pub fn len(&self) -> usize {
        match self {
            Self::Polygons(polygons) => polygons.len(),
            Self::BitMasks(masks) => masks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tight bounding boxes of each mask.
    ///
    /// An empty mask yields a zero box at the origin.
    pub fn bounding_boxes(&self) -> Vec<TLBR<f64>> {
        let zero = || TLBR::from_tlbr([0.0, 0.0, 0.0, 0.0]);
        match self {
            Self::Polygons(instances) => instances
                .iter()
                .map(|polygons| polygon::bounding_box(polygons).unwrap_or_else(zero))
                .collect(),
            Self::BitMasks(masks) => masks
                .iter()
                .map(|mask| bitmask_bounding_box(mask).unwrap_or_else(zero))
                .collect(),
        }
    }

    /// Check which masks cover a non-empty region.
    pub fn nonempty(&self) -> Vec<bool> {
        match self {
            Self::Polygons(instances) => instances
                .iter()
                .map(|polygons| !polygons.is_empty())
                .collect(),
            Self::BitMasks(masks) => masks
                .iter()
                .map(|mask| mask.iter().any(|&val| val))
                .collect(),
        }
    }

    /// Keep the masks whose flag is set.
    pub fn select(&self, keep: &[bool]) -> Self {
        fn pick<T: Clone>(items: &[T], keep: &[bool]) -> Vec<T> {
            izip!(items, keep)
                .filter(|&(_, &keep)| keep)
                .map(|(item, _)| item.clone())
                .collect()
        }

        match self {
            Self::Polygons(instances) => Self::Polygons(pick(instances, keep)),
            Self::BitMasks(masks) => Self::BitMasks(pick(masks, keep)),
        }
    }
}

/// The tight box of a mask, with the right and bottom sides exclusive.
pub fn bitmask_bounding_box(mask: &BitMask) -> Option<TLBR<f64>> {
    let rows: Vec<usize> = mask
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| row.iter().any(|&val| val))
        .map(|(index, _)| index)
        .collect();
    let cols: Vec<usize> = mask
        .axis_iter(Axis(1))
        .enumerate()
        .filter(|(_, col)| col.iter().any(|&val| val))
        .map(|(index, _)| index)
        .collect();

    let (&t, &b) = (rows.first()?, rows.last()?);
    let (&l, &r) = (cols.first()?, cols.last()?);
    Some(TLBR::from_tlbr([
        t as f64,
        l as f64,
        (b + 1) as f64,
        (r + 1) as f64,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn bitmask_box_is_exclusive() {
        let mask = array![
            [false, false, false, false],
            [false, true, true, false],
            [false, false, true, false],
        ];
        let rect = bitmask_bounding_box(&mask).unwrap();
        assert_eq!(rect.xyxy(), [1.0, 1.0, 3.0, 3.0]);
        assert!(bitmask_bounding_box(&Array2::from_elem((2, 2), false)).is_none());
    }

    #[test]
    fn polygon_masks_emptiness() {
        let masks = InstanceMasks::Polygons(vec![
            vec![vec![0.0, 0.0, 4.0, 0.0, 4.0, 2.0]],
            vec![],
        ]);
        assert_eq!(masks.nonempty(), vec![true, false]);
        let boxes = masks.bounding_boxes();
        assert_eq!(boxes[0].xyxy(), [0.0, 0.0, 4.0, 2.0]);
        assert_eq!(boxes[1].xyxy(), [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(masks.select(&[false, true]).len(), 1);
    }
}
