use crate::common::*;

/// Keypoints of all instances in `[n, k, 3]` layout, each row being
/// `[x, y, visibility]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Keypoints(pub Array3<f64>);

impl Keypoints {
    /// Stack flat `[x, y, v, x, y, v, ...]` lists of each instance.
    ///
    /// Every list must carry the same number of keypoints.
    pub fn from_flat(lists: &[Vec<f64>]) -> Result<Self> {
        let num_keypoints = match lists.first() {
            Some(first) => first.len() / 3,
            None => 0,
        };

        lists.iter().try_for_each(|list| {
            ensure!(
                list.len() % 3 == 0,
                "keypoint list length {} is not a multiple of 3",
                list.len()
            );
            ensure!(
                list.len() / 3 == num_keypoints,
                "expect {} keypoints per instance, but get {}",
                num_keypoints,
                list.len() / 3
            );
            Ok(())
        })?;

        let values: Vec<f64> = lists.iter().flatten().copied().collect();
        let array = Array3::from_shape_vec((lists.len(), num_keypoints, 3), values)?;
        Ok(Self(array))
    }

    pub fn len(&self) -> usize {
        self.0.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_keypoints(&self) -> usize {
        self.0.len_of(Axis(1))
    }

    pub fn select(&self, keep: &[bool]) -> Self {
        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter(|&(_, &keep)| keep)
            .map(|(index, _)| index)
            .collect();
        Self(self.0.select(Axis(0), &indices))
    }
}
