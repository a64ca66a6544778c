use crate::{common::*, policy::AnnType, proposals::Proposals};

/// A mapped sample ready for a model forward pass.
#[derive(Debug, Clone)]
pub struct Sample {
    pub file_name: Option<PathBuf>,
    pub image_id: Option<u64>,
    /// The height of the original image.
    pub height: usize,
    /// The width of the original image.
    pub width: usize,
    pub dataset_source: Option<usize>,
    /// The augmented image in `[c, h, w]` layout.
    pub image: Array3<u8>,
    /// The augmented semantic segmentation labels in `[h, w]` layout.
    pub sem_seg: Option<Array2<i64>>,
    pub instances: Option<Instances>,
    pub proposals: Option<Proposals>,
    pub pos_category_ids: Option<Vec<usize>>,
    pub ann_type: Option<AnnType>,
    /// Set if the objects of the sample are not exhaustively labeled.
    pub not_full_labeled: bool,
}

impl Sample {
    /// The size of the augmented image.
    pub fn image_size(&self) -> HW<usize> {
        let (_, h, w) = self.image.dim();
        HW::from_hw([h, w])
    }
}
