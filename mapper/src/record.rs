//! The input record schema.

use crate::common::*;
use image::DynamicImage;
use serde::de::IgnoredAny;

/// Where the pixels of a record come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An image file on disk.
    File(PathBuf),
    /// An already decoded image.
    Memory(Arc<DynamicImage>),
}

/// Precomputed region proposals of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordProposals {
    pub boxes: Vec<[f64; 4]>,
    pub objectness_logits: Vec<f64>,
    pub bbox_mode: BoxMode,
}

/// One raw dataset record.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct DatasetRecord {
    pub image: ImageSource,
    /// The declared image height, checked against the decoded image.
    pub height: Option<usize>,
    /// The declared image width, checked against the decoded image.
    pub width: Option<usize>,
    pub image_id: Option<u64>,
    pub sem_seg_file_name: Option<PathBuf>,
    pub annotations: Option<Vec<Annotation>>,
    /// The index of the dataset the record belongs to.
    pub dataset_source: Option<usize>,
    /// Image-level positive category labels.
    pub pos_category_ids: Option<Vec<usize>>,
    pub proposals: Option<RecordProposals>,
}

impl DatasetRecord {
    pub fn from_file<P>(file_name: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self::new(ImageSource::File(file_name.into()))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self::new(ImageSource::Memory(Arc::new(image)))
    }

    fn new(image: ImageSource) -> Self {
        Self {
            image,
            height: None,
            width: None,
            image_id: None,
            sem_seg_file_name: None,
            annotations: None,
            dataset_source: None,
            pos_category_ids: None,
            proposals: None,
        }
    }

    /// The image path, if the record is backed by a file.
    pub fn file_name(&self) -> Option<&Path> {
        match &self.image {
            ImageSource::File(path) => Some(path),
            ImageSource::Memory(_) => None,
        }
    }

    /// A human readable name for error messages.
    pub fn display_name(&self) -> String {
        match (&self.image, self.image_id) {
            (ImageSource::File(path), _) => path.display().to_string(),
            (ImageSource::Memory(_), Some(id)) => format!("<memory image {}>", id),
            (ImageSource::Memory(_), None) => "<memory image>".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    file_name: Option<PathBuf>,
    #[serde(default)]
    tar_index: Option<IgnoredAny>,
    #[serde(default)]
    height: Option<usize>,
    #[serde(default)]
    width: Option<usize>,
    #[serde(default)]
    image_id: Option<u64>,
    #[serde(default)]
    sem_seg_file_name: Option<PathBuf>,
    #[serde(default)]
    annotations: Option<Vec<Annotation>>,
    #[serde(default)]
    dataset_source: Option<usize>,
    #[serde(default)]
    pos_category_ids: Option<Vec<usize>>,
    #[serde(default)]
    proposal_boxes: Option<Vec<[f64; 4]>>,
    #[serde(default)]
    proposal_objectness_logits: Option<Vec<f64>>,
    #[serde(default)]
    proposal_bbox_mode: BoxMode,
}

impl TryFrom<RawRecord> for DatasetRecord {
    type Error = Error;

    fn try_from(from: RawRecord) -> Result<Self, Self::Error> {
        let RawRecord {
            file_name,
            tar_index,
            height,
            width,
            image_id,
            sem_seg_file_name,
            annotations,
            dataset_source,
            pos_category_ids,
            proposal_boxes,
            proposal_objectness_logits,
            proposal_bbox_mode,
        } = from;

        let image = match (file_name, tar_index) {
            (Some(file_name), _) => ImageSource::File(file_name),
            (None, Some(_)) => bail!("loading images from tar archives is not supported"),
            (None, None) => bail!("the record has no file_name"),
        };

        let proposals = match (proposal_boxes, proposal_objectness_logits) {
            (Some(boxes), Some(objectness_logits)) => {
                ensure!(
                    boxes.len() == objectness_logits.len(),
                    "{} proposal boxes but {} objectness logits",
                    boxes.len(),
                    objectness_logits.len()
                );
                Some(RecordProposals {
                    boxes,
                    objectness_logits,
                    bbox_mode: proposal_bbox_mode,
                })
            }
            (None, None) => None,
            _ => bail!("proposal_boxes and proposal_objectness_logits must come together"),
        };

        Ok(Self {
            image,
            height,
            width,
            image_id,
            sem_seg_file_name,
            annotations,
            dataset_source,
            pos_category_ids,
            proposals,
        })
    }
}

/// Load a JSON array of records.
pub fn load_records<P>(path: P) -> Result<Vec<DatasetRecord>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let records = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse records in '{}'", path.display()))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record() -> Result<()> {
        let text = r#"{
            "file_name": "images/0001.jpg",
            "height": 480,
            "width": 640,
            "image_id": 1,
            "dataset_source": 1,
            "pos_category_ids": [3, 5],
            "annotations": [
                {"bbox": [10, 10, 50, 50], "bbox_mode": 0, "category_id": 3, "iscrowd": 0}
            ],
            "proposal_boxes": [[0, 0, 10, 10]],
            "proposal_objectness_logits": [0.5]
        }"#;
        let record: DatasetRecord = serde_json::from_str(text)?;
        assert_eq!(record.file_name(), Some(Path::new("images/0001.jpg")));
        assert_eq!((record.height, record.width), (Some(480), Some(640)));
        assert_eq!(record.dataset_source, Some(1));
        assert_eq!(record.pos_category_ids, Some(vec![3, 5]));
        assert_eq!(record.annotations.as_ref().map(|anns| anns.len()), Some(1));
        let proposals = record.proposals.unwrap();
        assert_eq!(proposals.bbox_mode, BoxMode::XyxyAbs);
        assert_eq!(proposals.objectness_logits, vec![0.5]);
        Ok(())
    }

    #[test]
    fn tar_index_is_rejected() {
        let text = r#"{"tar_index": 12, "height": 4, "width": 4}"#;
        let err = serde_json::from_str::<DatasetRecord>(text).unwrap_err();
        assert!(err.to_string().contains("tar"));
    }

    #[test]
    fn unpaired_proposals_are_rejected() {
        let text = r#"{"file_name": "a.png", "proposal_boxes": [[0, 0, 1, 1]]}"#;
        assert!(serde_json::from_str::<DatasetRecord>(text).is_err());
    }

    #[test]
    fn memory_record_name() {
        let mut record = DatasetRecord::from_image(DynamicImage::new_rgb8(2, 2));
        assert!(record.file_name().is_none());
        record.image_id = Some(9);
        assert_eq!(record.display_name(), "<memory image 9>");
    }
}
