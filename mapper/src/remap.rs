//! Remap annotations through the transforms applied on the image.

use crate::common::*;
use label::polygon;

/// Map one annotation into the coordinate space of the augmented image.
///
/// The box is transformed by its corners and clipped to the image. Polygons
/// and masks follow the same transforms. Keypoints leaving the image are
/// marked unlabeled.
pub fn transform_instance_annotation(
    annotation: &Annotation,
    transforms: &TransformList,
    image_size: HW<usize>,
    keypoint_hflip_indices: Option<&[usize]>,
) -> Result<Annotation> {
    let [h, w] = image_size.cast::<f64>().hw();

    let rect = transforms.apply_box(&annotation.rect()?).clip_to(h, w);

    let segmentation = annotation
        .segmentation
        .as_ref()
        .map(|segm| transform_segmentation(segm, transforms))
        .transpose()?;

    let keypoints = annotation
        .keypoints
        .as_ref()
        .map(|kps| transform_keypoints(kps, transforms, image_size, keypoint_hflip_indices))
        .transpose()?;

    Ok(Annotation {
        bbox: rect.xyxy(),
        bbox_mode: BoxMode::XyxyAbs,
        category_id: annotation.category_id,
        segmentation,
        keypoints,
        iscrowd: annotation.iscrowd,
    })
}

fn transform_segmentation(
    segmentation: &Segmentation,
    transforms: &TransformList,
) -> Result<Segmentation> {
    let output = match segmentation {
        Segmentation::Polygons(polygons) => {
            polygons.iter().try_for_each(|p| polygon::validate(p))?;
            let points: Vec<_> = polygons.iter().map(|p| polygon::to_points(p)).collect();
            let polygons = transforms
                .apply_polygons(points)
                .iter()
                .map(|points| polygon::from_points(points))
                .collect();
            Segmentation::Polygons(polygons)
        }
        Segmentation::Rle(rle) => {
            let mask = rle.decode().context("invalid RLE segmentation")?;
            Segmentation::Bitmask(transforms.apply_bitmask(&mask)?)
        }
        Segmentation::Bitmask(mask) => Segmentation::Bitmask(transforms.apply_bitmask(mask)?),
    };
    Ok(output)
}

/// Map flat `[x, y, v]*` keypoints.
///
/// Points outside the image get zero visibility. On an odd number of
/// horizontal flips, left and right keypoints are swapped according to
/// `hflip_indices`. Unlabeled keypoints are zeroed.
pub fn transform_keypoints(
    keypoints: &[f64],
    transforms: &TransformList,
    image_size: HW<usize>,
    hflip_indices: Option<&[usize]>,
) -> Result<Vec<f64>> {
    ensure!(
        keypoints.len() % 3 == 0,
        "keypoint list length {} is not a multiple of 3",
        keypoints.len()
    );
    let [h, w] = image_size.cast::<f64>().hw();

    let mut points: Vec<[f64; 2]> = keypoints
        .chunks_exact(3)
        .map(|triple| [triple[0], triple[1]])
        .collect();
    transforms.apply_coords(&mut points);

    let mut rows: Vec<[f64; 3]> = izip!(&points, keypoints.chunks_exact(3))
        .map(|(&[x, y], triple)| {
            let inside = (0.0..=w).contains(&x) && (0.0..=h).contains(&y);
            let visibility = if inside { triple[2] } else { 0.0 };
            [x, y, visibility]
        })
        .collect();

    if transforms.flips_horizontally() {
        let indices =
            hflip_indices.ok_or_else(|| format_err!("cannot flip keypoints without flip indices"))?;
        ensure!(
            indices.len() == rows.len(),
            "keypoint flip indices have {} entries, but the annotation has {} keypoints",
            indices.len(),
            rows.len()
        );
        rows = indices
            .iter()
            .map(|&index| {
                rows.get(index)
                    .copied()
                    .ok_or_else(|| format_err!("keypoint flip index {} is out of range", index))
            })
            .try_collect()?;
    }

    let output = rows
        .into_iter()
        .flat_map(|row| if row[2] == 0.0 { [0.0; 3] } else { row })
        .collect();
    Ok(output)
}

/// Build the permutation that swaps left and right keypoints.
pub fn create_keypoint_hflip_indices(
    names: &[String],
    flip_map: &[(String, String)],
) -> Result<Vec<usize>> {
    let index_of: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();
    ensure!(
        index_of.len() == names.len(),
        "keypoint names must be unique"
    );

    let mut indices: Vec<usize> = (0..names.len()).collect();
    for (lhs, rhs) in flip_map {
        let lhs_index = *index_of
            .get(lhs.as_str())
            .ok_or_else(|| format_err!("unknown keypoint name '{}' in the flip map", lhs))?;
        let rhs_index = *index_of
            .get(rhs.as_str())
            .ok_or_else(|| format_err!("unknown keypoint name '{}' in the flip map", rhs))?;
        indices[lhs_index] = rhs_index;
        indices[rhs_index] = lhs_index;
    }

    Ok(indices)
}
