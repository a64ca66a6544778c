//! Precomputed region proposals.

use crate::{common::*, record::RecordProposals};
use std::cmp::Reverse;

/// Proposals in the augmented image space, sorted by descending objectness.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposals {
    pub boxes: Vec<TLBR<f64>>,
    pub objectness_logits: Vec<f64>,
}

impl Proposals {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Map proposals through the transforms applied on the image, then keep
/// the `topk` non-empty boxes of highest objectness.
///
/// The boxes are re-sorted by descending objectness before truncation, so
/// the input order does not matter. Ties keep their input order.
pub fn transform_proposals(
    proposals: &RecordProposals,
    transforms: &TransformList,
    image_size: HW<usize>,
    topk: usize,
) -> Result<Proposals> {
    let [h, w] = image_size.cast::<f64>().hw();

    let boxes: Vec<TLBR<f64>> = proposals
        .boxes
        .iter()
        .map(|&coords| -> Result<_> {
            let rect = proposals.bbox_mode.to_tlbr(coords)?;
            Ok(transforms.apply_box(&rect).clip_to(h, w))
        })
        .try_collect()
        .context("invalid proposal box")?;

    let mut kept: Vec<(TLBR<f64>, f64)> = izip!(boxes, proposals.objectness_logits.iter().copied())
        .filter(|(rect, _)| rect.is_nonempty(0.0))
        .collect();
    kept.sort_by_key(|&(_, logit)| Reverse(r64(logit)));
    kept.truncate(topk);

    let (boxes, objectness_logits) = kept.into_iter().unzip();
    Ok(Proposals {
        boxes,
        objectness_logits,
    })
}
