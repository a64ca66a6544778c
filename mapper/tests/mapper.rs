mod common;

use anyhow::Result;
use approx::assert_abs_diff_eq;
use augment::{AugmentationList, RandomFlipInit};
use bbox::prelude::*;
use common::{identity_config, Fixture, IMAGE_H, IMAGE_W};
use image::{DynamicImage, RgbImage};
use label::InstanceMasks;
use mapper::{AnnType, AugmentationPolicy, DatasetRecord, MapperInit};
use noisy_float::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;
use std::sync::Arc;

const H: usize = IMAGE_H as usize;
const W: usize = IMAGE_W as usize;

#[test]
fn single_instance_without_ann_type() -> Result<()> {
    let fixture = Fixture::new()?;
    let mapper = MapperInit::from_config(&identity_config("", "")?, true)?.build()?;
    let record = fixture.record(json!({
        "height": H,
        "width": W,
        "image_id": 1,
        "annotations": [
            {"bbox": [4, 4, 20, 20], "bbox_mode": 0, "category_id": 3, "iscrowd": 0}
        ],
    }))?;

    let sample = mapper.map_with_rng(&record, &mut StdRng::seed_from_u64(0))?;
    assert_eq!(sample.image.dim(), (3, H, W));
    assert_eq!((sample.height, sample.width), (H, W));
    assert_eq!(sample.image_id, Some(1));
    assert_eq!(sample.file_name.as_deref(), Some(fixture.image_file.as_path()));
    assert!(sample.ann_type.is_none());
    assert!(sample.pos_category_ids.is_none());
    assert!(!sample.not_full_labeled);

    let instances = sample.instances.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances.gt_classes, vec![3]);
    instances.gt_boxes[0]
        .xyxy()
        .iter()
        .zip([4.0, 4.0, 20.0, 20.0])
        .for_each(|(&lhs, rhs)| assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-6));
    Ok(())
}

#[test]
fn image_labeled_dataset() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = identity_config(
        "",
        r#"with_image_labels: true, dataloader: { dataset_ann: ["box", "image"] },"#,
    )?;
    let mapper = MapperInit::from_config(&config, true)?.build()?;

    let record = fixture.record(json!({
        "dataset_source": 1,
        "pos_category_ids": [3, 5],
        "annotations": [],
    }))?;
    let sample = mapper.map(&record)?;
    assert_eq!(sample.ann_type, Some(AnnType::Image));
    assert_eq!(sample.pos_category_ids, Some(vec![3, 5]));
    assert!(sample.not_full_labeled);
    assert!(sample.instances.unwrap().is_empty());

    let record = fixture.record(json!({
        "dataset_source": 1,
        "pos_category_ids": [3],
        "annotations": [{"bbox": [4, 4, 20, 20], "category_id": 3}],
    }))?;
    let sample = mapper.map(&record)?;
    assert_eq!(sample.ann_type, Some(AnnType::Image));
    let instances = sample.instances.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances.gt_classes, vec![3]);

    let record = fixture.record(json!({ "dataset_source": 1 }))?;
    let sample = mapper.map(&record)?;
    assert_eq!(sample.pos_category_ids, Some(vec![]));

    let record = fixture.record(json!({ "dataset_source": 0 }))?;
    let sample = mapper.map(&record)?;
    assert_eq!(sample.ann_type, Some(AnnType::Box));
    assert!(!sample.not_full_labeled);

    let record = fixture.record(json!({}))?;
    assert!(mapper.map(&record).is_err());
    Ok(())
}

#[test]
fn debug_mode_backfills_labels() -> Result<()> {
    let fixture = Fixture::new()?;
    let mapper = MapperInit::from_config(&identity_config("", "is_debug: true,")?, true)?.build()?;
    let record = fixture.record(json!({
        "annotations": [
            {"bbox": [0, 0, 10, 10], "category_id": 7},
            {"bbox": [10, 10, 20, 20], "category_id": 7},
        ],
    }))?;

    let sample = mapper.map(&record)?;
    assert_eq!(sample.dataset_source, Some(0));
    assert_eq!(sample.pos_category_ids, Some(vec![7]));
    Ok(())
}

#[test]
fn debug_backfill_ignores_ann_type() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = identity_config(
        "",
        r#"is_debug: true, with_image_labels: true, dataloader: { dataset_ann: ["image"] },"#,
    )?;
    let mapper = MapperInit::from_config(&config, true)?.build()?;
    let record = fixture.record(json!({
        "pos_category_ids": [],
        "annotations": [
            {"bbox": [0, 0, 10, 10], "category_id": 9},
            {"bbox": [10, 10, 20, 20], "category_id": 2},
        ],
    }))?;

    let sample = mapper.map(&record)?;
    assert_eq!(sample.ann_type, Some(AnnType::Image));
    assert!(sample.not_full_labeled);
    assert_eq!(sample.pos_category_ids, Some(vec![2, 9]));
    Ok(())
}

#[test]
fn tar_dataset_is_rejected() -> Result<()> {
    let config = identity_config("", "dataloader: { use_tar_dataset: true },")?;
    let err = MapperInit::from_config(&config, true)?.build().unwrap_err();
    assert!(err.to_string().contains("tar"));
    Ok(())
}

#[test]
fn inference_drops_annotations() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = identity_config("", "model: { load_proposals: true },")?;
    let mapper = MapperInit::from_config(&config, false)?.build()?;
    let record = fixture.record(json!({
        "sem_seg_file_name": common::path_str(&fixture.sem_seg_file),
        "annotations": [{"bbox": [4, 4, 20, 20], "category_id": 3}],
        "proposal_boxes": [[0, 0, 8, 8], [40, 0, 60, 10], [0, 0, 0, 5]],
        "proposal_objectness_logits": [1.0, 2.0, 3.0],
    }))?;

    let sample = mapper.map(&record)?;
    assert!(sample.instances.is_none());
    assert!(sample.ann_type.is_none());

    let sem_seg = sample.sem_seg.unwrap();
    assert_eq!(sem_seg.dim(), (H, W));
    assert_eq!(sem_seg[[0, 0]], 1);
    assert_eq!(sem_seg[[0, W - 1]], 2);

    let proposals = sample.proposals.unwrap();
    assert_eq!(proposals.objectness_logits, vec![2.0, 1.0]);
    assert_eq!(proposals.boxes[0].xyxy(), [40.0, 0.0, W as f64, 10.0]);
    Ok(())
}

#[test]
fn shared_pipeline_ignores_dataset_source() -> Result<()> {
    let fixture = Fixture::new()?;
    let mapper = MapperInit::from_config(&identity_config("", "")?, true)?.build()?;
    assert!(matches!(
        mapper.augmentation_policy(),
        AugmentationPolicy::Shared(_)
    ));

    for source in [0, 5] {
        let record = fixture.record(json!({ "dataset_source": source }))?;
        let sample = mapper.map(&record)?;
        assert_eq!(sample.image.dim(), (3, H, W));
        assert_eq!(sample.dataset_source, Some(source));
    }
    Ok(())
}

#[test]
fn per_dataset_pipelines() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = identity_config(
        r#"custom_aug: "ResizeShortestEdge","#,
        r#"dataloader: {
            use_diff_bs_size: true,
            dataset_min_sizes: [[64, 64], [16, 16]],
            dataset_max_sizes: [1000, 1000],
        },"#,
    )?;
    let mapper = MapperInit::from_config(&config, true)?.build()?;

    let record = fixture.record(json!({
        "dataset_source": 0,
        "annotations": [{"bbox": [8, 8, 24, 24], "category_id": 1}],
    }))?;
    let sample = mapper.map(&record)?;
    assert_eq!(sample.image.dim(), (3, 64, 96));
    let rect = &sample.instances.unwrap().gt_boxes[0];
    assert_abs_diff_eq!(rect.h(), 32.0, epsilon = 1e-6);
    assert_abs_diff_eq!(rect.w(), 32.0, epsilon = 1e-6);

    let record = fixture.record(json!({ "dataset_source": 1 }))?;
    assert_eq!(mapper.map(&record)?.image.dim(), (3, 16, 24));

    let record = fixture.record(json!({ "dataset_source": 2 }))?;
    assert!(mapper.map(&record).is_err());
    let record = fixture.record(json!({}))?;
    assert!(mapper.map(&record).is_err());

    // inference always uses the shared pipeline
    let mapper = MapperInit::from_config(&config, false)?.build()?;
    assert!(matches!(
        mapper.augmentation_policy(),
        AugmentationPolicy::Shared(_)
    ));
    Ok(())
}

#[test]
fn crowd_instances_are_excluded() -> Result<()> {
    let fixture = Fixture::new()?;
    let mapper = MapperInit::from_config(&identity_config("", "")?, true)?.build()?;
    let record = fixture.record(json!({
        "annotations": [
            {"bbox": [0, 0, 10, 10], "category_id": 1, "iscrowd": 1},
            {"bbox": [10, 10, 20, 20], "category_id": 2, "iscrowd": 0},
            {"bbox": [30, 10, 30, 20], "category_id": 4},
        ],
    }))?;

    let instances = mapper.map(&record)?.instances.unwrap();
    assert_eq!(instances.gt_classes, vec![2]);
    Ok(())
}

#[test]
fn recompute_boxes_from_masks() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = identity_config(
        r#"mask_format: "bitmask", crop: { size: { type: "relative", h: 1.0, w: 1.0 } },"#,
        "model: { mask_on: true },",
    )?;
    let init = MapperInit::from_config(&config, true)?;
    assert!(init.recompute_boxes);
    let mapper = init.build()?;

    let record = fixture.record(json!({
        "annotations": [{
            "bbox": [0, 0, 40, 30],
            "category_id": 1,
            "segmentation": [[8, 8, 24, 8, 24, 16, 8, 16]],
        }],
    }))?;

    let instances = mapper.map(&record)?.instances.unwrap();
    assert_eq!(instances.len(), 1);
    let masks = instances.gt_masks.as_ref().unwrap();
    assert!(matches!(masks, InstanceMasks::BitMasks(_)));
    assert_eq!(instances.gt_boxes, masks.bounding_boxes());
    assert_eq!(instances.gt_boxes[0].xyxy(), [8.0, 8.0, 24.0, 16.0]);
    Ok(())
}

#[test]
fn malformed_rle_segmentation_fails() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = identity_config(r#"mask_format: "bitmask","#, "model: { mask_on: true },")?;
    let mapper = MapperInit::from_config(&config, true)?.build()?;

    let record = fixture.record(json!({
        "annotations": [{
            "bbox": [0, 0, 10, 10],
            "category_id": 1,
            "segmentation": {"size": [32, 48], "counts": "oooooooooooooooo0"},
        }],
    }))?;
    assert!(mapper.map(&record).is_err());
    Ok(())
}

#[test]
fn image_size_mismatch_fails() -> Result<()> {
    let fixture = Fixture::new()?;
    let mapper = MapperInit::from_config(&identity_config("", "")?, true)?.build()?;
    let record = fixture.record(json!({ "height": 10, "width": W }))?;
    let err = mapper.map(&record).unwrap_err();
    assert!(format!("{:#}", err).contains("mismatched image size"));
    Ok(())
}

#[test]
fn keypoints_follow_horizontal_flip() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = identity_config(
        "",
        r#"model: { keypoint_on: true },
        metadata: {
            keypoint_names: ["nose", "left_eye", "right_eye"],
            keypoint_flip_map: [["left_eye", "right_eye"]],
        },"#,
    )?;
    let mut init = MapperInit::from_config(&config, true)?;
    init.augmentations = AugmentationList::new(vec![Arc::new(
        RandomFlipInit {
            prob: r64(1.0),
            ..Default::default()
        }
        .build()?,
    )]);
    let mapper = init.build()?;

    let record = fixture.record(json!({
        "annotations": [{
            "bbox": [16, 5, 32, 15],
            "category_id": 1,
            "keypoints": [24, 10, 2, 20, 10, 2, 28, 10, 1],
        }],
    }))?;

    let instances = mapper.map(&record)?.instances.unwrap();
    let keypoints = instances.gt_keypoints.unwrap();
    assert_eq!(keypoints.num_keypoints(), 3);
    assert_eq!(keypoints.0[[0, 0, 0]], 24.0);
    assert_eq!(keypoints.0[[0, 1, 0]], 20.0);
    assert_eq!(keypoints.0[[0, 1, 2]], 1.0);
    assert_eq!(keypoints.0[[0, 2, 0]], 28.0);
    assert_eq!(keypoints.0[[0, 2, 2]], 2.0);
    Ok(())
}

#[test]
fn unknown_flip_names_fail_construction() -> Result<()> {
    let config = identity_config(
        "",
        r#"model: { keypoint_on: true },
        metadata: { keypoint_names: ["nose"], keypoint_flip_map: [["left_eye", "right_eye"]] },"#,
    )?;
    assert!(MapperInit::from_config(&config, true).is_err());
    Ok(())
}

#[test]
fn memory_image_record() -> Result<()> {
    let mapper = MapperInit::from_config(&identity_config("", "")?, false)?.build()?;
    let image = DynamicImage::ImageRgb8(RgbImage::new(IMAGE_W, IMAGE_H));
    let mut record = DatasetRecord::from_image(image);
    record.height = Some(H);

    let sample = mapper.map(&record)?;
    assert!(sample.file_name.is_none());
    assert_eq!(sample.image.dim(), (3, H, W));
    assert_eq!(sample.width, W);
    Ok(())
}

#[test]
fn record_is_not_modified() -> Result<()> {
    let fixture = Fixture::new()?;
    let mapper = MapperInit::from_config(&identity_config("", "is_debug: true,")?, true)?.build()?;
    let record = fixture.record(json!({
        "dataset_source": 4,
        "annotations": [{"bbox": [4, 4, 20, 20], "category_id": 3}],
    }))?;
    let before = format!("{:?}", record);

    mapper.map(&record)?;
    assert_eq!(format!("{:?}", record), before);
    assert_eq!(record.dataset_source, Some(4));
    Ok(())
}
