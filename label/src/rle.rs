//! COCO run-length encoding.
//!
//! Runs alternate between zeros and ones, starting with zeros, and walk the
//! mask in column-major order.

use crate::{common::*, BitMask};

/// A run-length encoded mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rle {
    /// Mask size in `[h, w]`.
    pub size: [usize; 2],
    pub counts: RleCounts,
}

/// Run lengths, either plain or in the COCO compressed string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RleCounts {
    Uncompressed(Vec<u64>),
    Compressed(String),
}

impl Rle {
    /// Encode a mask into uncompressed runs.
    pub fn encode(mask: &BitMask) -> Self {
        let (h, w) = mask.dim();
        Self {
            size: [h, w],
            counts: RleCounts::Uncompressed(mask_to_runs(mask)),
        }
    }

    /// Encode a mask into the compressed string form.
    pub fn encode_compressed(mask: &BitMask) -> Self {
        let (h, w) = mask.dim();
        Self {
            size: [h, w],
            counts: RleCounts::Compressed(counts_to_string(&mask_to_runs(mask))),
        }
    }

    /// Decode into a `[h, w]` mask.
    pub fn decode(&self) -> Result<BitMask> {
        let [h, w] = self.size;
        let counts = match &self.counts {
            RleCounts::Uncompressed(counts) => counts.clone(),
            RleCounts::Compressed(text) => counts_from_string(text)?,
        };

        let area = h
            .checked_mul(w)
            .ok_or_else(|| format_err!("mask size {}x{} is too large", h, w))?;
        let total = counts
            .iter()
            .try_fold(0u64, |sum, &len| sum.checked_add(len))
            .ok_or_else(|| format_err!("RLE runs overflow"))?;
        ensure!(
            total == area as u64,
            "RLE runs sum to {}, but the mask size {}x{} requires {}",
            total,
            h,
            w,
            area
        );

        let mut values = Vec::with_capacity(area);
        counts.iter().enumerate().for_each(|(index, &len)| {
            let val = index % 2 == 1;
            values.extend(iter::repeat(val).take(len as usize));
        });

        // values are stored column by column
        let mask = Array2::from_shape_vec((w, h), values)?.reversed_axes();
        Ok(mask.as_standard_layout().into_owned())
    }
}

fn mask_to_runs(mask: &BitMask) -> Vec<u64> {
    let mut counts = vec![];
    let mut current = false;
    let mut run = 0u64;

    // transpose to walk in column-major order
    for &val in mask.t().iter() {
        if val != current {
            counts.push(run);
            run = 0;
            current = val;
        }
        run += 1;
    }
    counts.push(run);
    counts
}

fn counts_from_string(text: &str) -> Result<Vec<u64>> {
    let bytes = text.as_bytes();
    let mut counts: Vec<i64> = vec![];
    let mut pos = 0;

    while pos < bytes.len() {
        let mut val: i64 = 0;
        let mut shift = 0;

        loop {
            ensure!(pos < bytes.len(), "truncated RLE string");
            let byte = bytes[pos];
            ensure!(
                (48..48 + 64).contains(&byte),
                "invalid character '{}' in RLE string",
                byte as char
            );
            // 12 chunks fill 60 bits
            ensure!(shift < 12, "RLE run at byte {} is too long", pos);
            let chunk = (byte - 48) as i64;
            val |= (chunk & 0x1f) << (5 * shift);
            pos += 1;
            shift += 1;

            if chunk & 0x20 == 0 {
                if chunk & 0x10 != 0 {
                    val |= -1 << (5 * shift);
                }
                break;
            }
        }

        // runs after the second are stored as deltas
        if counts.len() > 2 {
            val = val
                .checked_add(counts[counts.len() - 2])
                .ok_or_else(|| format_err!("RLE run overflows"))?;
        }
        counts.push(val);
    }

    counts
        .into_iter()
        .map(|val| {
            ensure!(val >= 0, "negative run length {} in RLE string", val);
            Ok(val as u64)
        })
        .try_collect()
}

fn counts_to_string(counts: &[u64]) -> String {
    let mut text = String::new();

    for (index, &count) in counts.iter().enumerate() {
        let mut val = count as i64;
        if index > 2 {
            val -= counts[index - 2] as i64;
        }

        let mut more = true;
        while more {
            let mut chunk = val & 0x1f;
            val >>= 5;
            more = if chunk & 0x10 != 0 { val != -1 } else { val != 0 };
            if more {
                chunk |= 0x20;
            }
            text.push((chunk as u8 + 48) as char);
        }
    }

    text
}
