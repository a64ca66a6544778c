pub use anyhow::{bail, ensure, format_err, Context as _, Result};
pub use bbox::{prelude::*, BoxMode, HW, TLBR};
pub use itertools::{izip, Itertools as _};
pub use log::debug;
pub use ndarray::{Array2, Array3, Axis};
pub use serde::{Deserialize, Deserializer, Serialize};
pub use std::{collections::BTreeSet, iter};
