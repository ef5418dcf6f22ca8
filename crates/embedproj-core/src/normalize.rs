//! Per-dimension min-max rescaling of coordinate batches.

use crate::types::TargetRange;

#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateNormalizer;

impl CoordinateNormalizer {
    /// Rescale every dimension of `coords` independently into `range`.
    ///
    /// A dimension whose values are all equal maps to the midpoint of
    /// `range`. Rows shorter than a dimension do not contribute to its
    /// bounds and keep their own length.
    pub fn normalize(coords: &[Vec<f32>], range: TargetRange) -> Vec<Vec<f32>> {
        let width = coords.iter().map(Vec::len).max().unwrap_or(0);

        let mut mins = vec![f32::INFINITY; width];
        let mut maxs = vec![f32::NEG_INFINITY; width];
        for row in coords {
            for (d, &v) in row.iter().enumerate() {
                mins[d] = mins[d].min(v);
                maxs[d] = maxs[d].max(v);
            }
        }

        // f64 so extents between finite f32 bounds cannot overflow
        let span = range.max as f64 - range.min as f64;
        let midpoint = range.midpoint();

        coords
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(d, &v)| {
                        let extent = maxs[d] as f64 - mins[d] as f64;
                        if extent == 0.0 {
                            midpoint
                        } else {
                            let t = (v as f64 - mins[d] as f64) / extent;
                            (range.min as f64 + t * span) as f32
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
