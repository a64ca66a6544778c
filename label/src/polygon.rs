//! Polygon helpers. Polygons are flat `[x, y, x, y, ...]` coordinate lists.

use crate::{common::*, BitMask};

/// Check that the polygon has an even number of coordinates and at least
/// three vertices.
pub fn validate(polygon: &[f64]) -> Result<()> {
    ensure!(
        polygon.len() % 2 == 0 && polygon.len() >= 6,
        "cannot create a polygon from {} coordinates",
        polygon.len()
    );
    ensure!(
        polygon.iter().all(|val| val.is_finite()),
        "polygon coordinates must be finite"
    );
    Ok(())
}

pub fn to_points(polygon: &[f64]) -> Vec<[f64; 2]> {
    polygon.chunks_exact(2).map(|xy| [xy[0], xy[1]]).collect()
}

pub fn from_points(points: &[[f64; 2]]) -> Vec<f64> {
    points.iter().flat_map(|&[x, y]| [x, y]).collect()
}

/// The tight box over all vertices of all polygons.
pub fn bounding_box(polygons: &[Vec<f64>]) -> Option<TLBR<f64>> {
    TLBR::enclosing(
        polygons
            .iter()
            .flat_map(|polygon| polygon.chunks_exact(2).map(|xy| [xy[0], xy[1]])),
    )
}

/// Clip a polygon to an axis-aligned window by Sutherland-Hodgman.
///
/// It returns an empty list if the polygon falls outside the window.
pub fn clip_to_rect(points: &[[f64; 2]], window: &TLBR<f64>) -> Vec<[f64; 2]> {
    let [x0, y0, x1, y1] = window.xyxy();

    // each edge: inside test and intersection with the boundary line
    type Inside = Box<dyn Fn([f64; 2]) -> bool>;
    let edges: [(Inside, usize, f64); 4] = [
        (Box::new(move |[x, _]: [f64; 2]| x >= x0), 0, x0),
        (Box::new(move |[x, _]: [f64; 2]| x <= x1), 0, x1),
        (Box::new(move |[_, y]: [f64; 2]| y >= y0), 1, y0),
        (Box::new(move |[_, y]: [f64; 2]| y <= y1), 1, y1),
    ];

    edges
        .iter()
        .fold(points.to_vec(), |input, (inside, axis, bound)| {
            if input.is_empty() {
                return input;
            }

            let intersect = |p: [f64; 2], q: [f64; 2]| -> [f64; 2] {
                let ratio = (bound - p[*axis]) / (q[*axis] - p[*axis]);
                let mut point = [
                    p[0] + (q[0] - p[0]) * ratio,
                    p[1] + (q[1] - p[1]) * ratio,
                ];
                point[*axis] = *bound;
                point
            };

            let mut output = vec![];
            let mut prev = input[input.len() - 1];
            for &curr in &input {
                match (inside(prev), inside(curr)) {
                    (true, true) => output.push(curr),
                    (true, false) => output.push(intersect(prev, curr)),
                    (false, true) => {
                        output.push(intersect(prev, curr));
                        output.push(curr);
                    }
                    (false, false) => {}
                }
                prev = curr;
            }
            output
        })
}

/// Rasterize polygons into an `[h, w]` mask.
///
/// A pixel is set if its center lies inside any polygon by the even-odd rule.
pub fn rasterize(polygons: &[Vec<f64>], h: usize, w: usize) -> BitMask {
    let mut mask = Array2::from_elem((h, w), false);

    for polygon in polygons {
        let points = to_points(polygon);
        if points.len() < 3 {
            continue;
        }

        for row in 0..h {
            let cy = row as f64 + 0.5;
            let mut crossings: Vec<f64> = points
                .iter()
                .zip(points.iter().cycle().skip(1))
                .filter(|([_, ya], [_, yb])| (*ya <= cy) != (*yb <= cy))
                .map(|([xa, ya], [xb, yb])| xa + (cy - ya) * (xb - xa) / (yb - ya))
                .collect();
            crossings.sort_by(|lhs, rhs| lhs.total_cmp(rhs));

            for span in crossings.chunks_exact(2) {
                let begin = (span[0] - 0.5).ceil().max(0.0) as usize;
                let end = ((span[1] - 0.5).ceil().max(0.0) as usize).min(w);
                for col in begin..end {
                    mask[[row, col]] = true;
                }
            }
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterize_square() {
        let square = vec![1.0, 1.0, 3.0, 1.0, 3.0, 3.0, 1.0, 3.0];
        let mask = rasterize(&[square], 4, 5);
        let count = mask.iter().filter(|&&val| val).count();
        assert_eq!(count, 4);
        assert!(mask[[1, 1]] && mask[[2, 2]]);
        assert!(!mask[[0, 0]] && !mask[[3, 3]]);
    }

    #[test]
    fn clip_triangle_to_window() {
        let window = TLBR::try_from_xyxy([0.0, 0.0, 2.0, 2.0]).unwrap();
        let clipped = clip_to_rect(&[[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]], &window);
        let rect = TLBR::enclosing(clipped.iter().copied()).unwrap();
        assert_eq!(rect.xyxy(), [0.0, 0.0, 2.0, 2.0]);

        let outside = clip_to_rect(&[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0]], &window);
        assert!(outside.is_empty());
    }

    #[test]
    fn odd_polygon_is_invalid() {
        assert!(validate(&[0.0, 0.0, 1.0, 1.0, 2.0]).is_err());
        assert!(validate(&[0.0, 0.0, 1.0, 1.0]).is_err());
        let bbox = bounding_box(&[vec![0.0, 1.0, 4.0, 1.0, 2.0, 5.0]]).unwrap();
        assert_eq!(bbox.xyxy(), [0.0, 1.0, 4.0, 5.0]);
    }
}
