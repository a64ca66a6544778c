pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use augment::{AugmentationList, Image, LabelMap, TransformList};
pub use bbox::{prelude::*, BoxMode, HW, TLBR};
pub use itertools::{izip, Itertools as _};
pub use label::{Annotation, Instances, MaskFormat, Segmentation};
pub use log::{info, trace};
pub use ndarray::{Array2, Array3};
pub use noisy_float::prelude::*;
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
