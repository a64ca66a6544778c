pub use anyhow::{ensure, format_err, Context as _, Result};
pub use bbox::{prelude::*, HW, TLBR};
pub use itertools::Itertools as _;
pub use label::BitMask;
pub use log::trace;
pub use ndarray::{s, Array2, Array3, Axis};
pub use noisy_float::prelude::*;
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::fmt::Debug;
