//! Per-dataset selection strategies.

use crate::common::*;

/// The declared completeness of a dataset's object labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnType {
    /// Exhaustive box annotations.
    Box,
    /// Image-level category tags only.
    Image,
    /// Tags mined from captions.
    Captiontag,
}

impl AnnType {
    pub fn is_full_box(&self) -> bool {
        matches!(self, Self::Box)
    }
}

impl fmt::Display for AnnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Box => "box",
            Self::Image => "image",
            Self::Captiontag => "captiontag",
        };
        write!(f, "{}", name)
    }
}

/// Which augmentation pipeline runs on a record.
#[derive(Debug, Clone)]
pub enum AugmentationPolicy {
    /// One pipeline for every record.
    Shared(AugmentationList),
    /// One pipeline per dataset source, indexed by the record's tag.
    PerDataset(Vec<AugmentationList>),
}

impl AugmentationPolicy {
    pub fn select(&self, dataset_source: Option<usize>) -> Result<&AugmentationList> {
        match self {
            Self::Shared(augmentations) => Ok(augmentations),
            Self::PerDataset(augmentations) => {
                let source = dataset_source.ok_or_else(|| {
                    format_err!("per-dataset augmentation requires a dataset_source tag")
                })?;
                augmentations.get(source).ok_or_else(|| {
                    format_err!(
                        "dataset_source {} is out of range, only {} pipelines are configured",
                        source,
                        augmentations.len()
                    )
                })
            }
        }
    }
}

/// Whether records carry the annotation type of their dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationPolicy {
    /// Every dataset is treated as exhaustively labeled and no type is
    /// attached.
    Untyped,
    /// The annotation type of each dataset, indexed by the record's tag.
    Typed(Vec<AnnType>),
}

impl AnnotationPolicy {
    /// The annotation type of a dataset, or `None` for untyped policies.
    pub fn ann_type(&self, dataset_source: Option<usize>) -> Result<Option<AnnType>> {
        match self {
            Self::Untyped => Ok(None),
            Self::Typed(types) => {
                let source = dataset_source.ok_or_else(|| {
                    format_err!("typed annotations require a dataset_source tag")
                })?;
                let ann_type = types.get(source).copied().ok_or_else(|| {
                    format_err!(
                        "dataset_source {} is out of range, only {} annotation types are configured",
                        source,
                        types.len()
                    )
                })?;
                Ok(Some(ann_type))
            }
        }
    }

    /// Check if the record's objects cannot be trusted as exhaustive.
    ///
    /// Records without a `dataset_source` tag are never flagged.
    pub fn not_full_labeled(&self, dataset_source: Option<usize>) -> Result<bool> {
        match (self, dataset_source) {
            (Self::Typed(_), Some(_)) => {
                let ann_type = self.ann_type(dataset_source)?;
                Ok(!matches!(ann_type, Some(AnnType::Box)))
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_policy_ignores_source() -> Result<()> {
        let policy = AugmentationPolicy::Shared(AugmentationList::default());
        assert!(policy.select(None)?.is_empty());
        assert!(policy.select(Some(42))?.is_empty());
        Ok(())
    }

    #[test]
    fn per_dataset_policy_requires_source() {
        let policy = AugmentationPolicy::PerDataset(vec![AugmentationList::default()]);
        assert!(policy.select(Some(0)).is_ok());
        assert!(policy.select(Some(1)).is_err());
        assert!(policy.select(None).is_err());
    }

    #[test]
    fn not_full_labeled_flags() -> Result<()> {
        let policy = AnnotationPolicy::Typed(vec![AnnType::Box, AnnType::Image]);
        assert!(!policy.not_full_labeled(Some(0))?);
        assert!(policy.not_full_labeled(Some(1))?);
        assert!(!policy.not_full_labeled(None)?);
        assert!(policy.not_full_labeled(Some(2)).is_err());

        assert!(!AnnotationPolicy::Untyped.not_full_labeled(Some(1))?);
        assert_eq!(AnnotationPolicy::Untyped.ann_type(Some(1))?, None);
        assert_eq!(policy.ann_type(Some(1))?, Some(AnnType::Image));
        assert_eq!(AnnType::Captiontag.to_string(), "captiontag");
        Ok(())
    }
}
