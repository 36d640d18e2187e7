// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance snapping ahead of boolean operations
//!
//! Two passes make edges that are coincident within tolerance exactly
//! coincident, so the overlay sees shared boundaries instead of hairline
//! overlaps or gaps:
//!
//! 1. Vertices are visited in lexicographic order. Each one snaps to the
//!    nearest representative within the tolerance or becomes a
//!    representative itself. Representatives never move, so no vertex
//!    travels further than the tolerance however dense the input is, and
//!    the result does not depend on input order.
//! 2. Any vertex lying within the tolerance of the interior of an edge is
//!    inserted into that edge (T-junction repair).

use std::cmp::Ordering;

use nalgebra::Point2;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::contour::{segment_distance, Contour};

/// Snap every contour in place against all the others (and itself)
pub fn snap_contours(contours: &mut [Contour], tolerance: f64) {
    if contours.is_empty() || tolerance <= 0.0 {
        return;
    }

    cluster_vertices(contours, tolerance);
    insert_t_junctions(contours, tolerance);

    for contour in contours.iter_mut() {
        remove_consecutive_duplicates(contour);
    }
}

fn cluster_vertices(contours: &mut [Contour], tolerance: f64) {
    let mut points: Vec<Point2<f64>> = contours.iter().flatten().cloned().collect();
    if points.is_empty() {
        return;
    }
    points.sort_by(lexicographic_cmp);
    points.dedup();

    let cell_size = tolerance;
    let cell_of = |p: &Point2<f64>| {
        (
            (p.x / cell_size).floor() as i64,
            (p.y / cell_size).floor() as i64,
        )
    };
    let key = |p: &Point2<f64>| (p.x.to_bits(), p.y.to_bits());

    let mut representatives: Vec<Point2<f64>> = Vec::new();
    let mut grid: FxHashMap<(i64, i64), SmallVec<[usize; 4]>> = FxHashMap::default();
    let mut snapped: FxHashMap<(u64, u64), Point2<f64>> = FxHashMap::default();

    for p in &points {
        let (cx, cy) = cell_of(p);
        let mut nearest: Option<(f64, Point2<f64>)> = None;
        // Search 3x3 neighborhood
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &r in candidates {
                    let rep = representatives[r];
                    let d = (rep - p).norm();
                    if d > tolerance {
                        continue;
                    }
                    let closer = match nearest {
                        None => true,
                        Some((best, q)) => d < best || (d == best && lexicographic_cmp(&rep, &q).is_lt()),
                    };
                    if closer {
                        nearest = Some((d, rep));
                    }
                }
            }
        }

        let target = match nearest {
            Some((_, rep)) => rep,
            None => {
                grid.entry((cx, cy)).or_default().push(representatives.len());
                representatives.push(*p);
                *p
            }
        };
        snapped.insert(key(p), target);
    }

    for contour in contours.iter_mut() {
        for p in contour.iter_mut() {
            if let Some(target) = snapped.get(&key(p)) {
                *p = *target;
            }
        }
    }
}

fn insert_t_junctions(contours: &mut [Contour], tolerance: f64) {
    let points: Vec<Point2<f64>> = contours.iter().flatten().cloned().collect();

    for contour in contours.iter_mut() {
        let n = contour.len();
        if n < 2 {
            continue;
        }

        let mut rebuilt: Contour = Vec::with_capacity(n);
        for i in 0..n {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            rebuilt.push(a);

            let min_x = a.x.min(b.x) - tolerance;
            let max_x = a.x.max(b.x) + tolerance;
            let min_y = a.y.min(b.y) - tolerance;
            let max_y = a.y.max(b.y) + tolerance;

            let mut inserts: SmallVec<[(f64, Point2<f64>); 2]> = SmallVec::new();
            for p in &points {
                if p.x < min_x || p.x > max_x || p.y < min_y || p.y > max_y {
                    continue;
                }
                if (p - a).norm() <= tolerance || (p - b).norm() <= tolerance {
                    continue;
                }
                let (d, t) = segment_distance(p, &a, &b);
                if d <= tolerance && t > 0.0 && t < 1.0 {
                    inserts.push((t, *p));
                }
            }

            inserts.sort_by(|x, y| x.0.total_cmp(&y.0));
            for (_, p) in inserts {
                if rebuilt.last() != Some(&p) {
                    rebuilt.push(p);
                }
            }
        }

        *contour = rebuilt;
    }
}

fn remove_consecutive_duplicates(contour: &mut Contour) {
    contour.dedup();
    while contour.len() > 1 && contour.first() == contour.last() {
        contour.pop();
    }
}

fn lexicographic_cmp(a: &Point2<f64>, b: &Point2<f64>) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn test_cluster_is_order_independent() {
        let a = rect(0.0, 0.0, 2.5, 10.0);
        let b = rect(2.504, 0.002, 5.0, 10.0);

        let mut forward = vec![a.clone(), b.clone()];
        let mut backward = vec![b, a];
        snap_contours(&mut forward, 0.01);
        snap_contours(&mut backward, 0.01);

        assert_eq!(forward[0], backward[1]);
        assert_eq!(forward[1], backward[0]);
        // Shared corner moved to the smaller representative
        assert_eq!(forward[1][0], Point2::new(2.5, 0.0));
    }

    #[test]
    fn test_t_junction_inserted() {
        let mut contours = vec![rect(0.0, 0.0, 10.0, 10.0), rect(10.004, 2.0, 13.0, 5.0)];
        snap_contours(&mut contours, 0.01);

        // The big square picks up both near-edge vertices of the small one
        assert_eq!(contours[0].len(), 6);
        assert!(contours[0].contains(&Point2::new(10.004, 2.0)));
        assert!(contours[0].contains(&Point2::new(10.004, 5.0)));
        assert_eq!(contours[1].len(), 4);
    }

    #[test]
    fn test_dense_run_does_not_drift() {
        // Bottom edge carries a vertex every half tolerance
        let mut square = vec![Point2::new(0.0, 0.0)];
        square.extend((1..2000).map(|i| Point2::new(i as f64 * 0.005, 0.0)));
        square.extend([Point2::new(10.0, 0.0), Point2::new(10.0, 10.0), Point2::new(0.0, 10.0)]);
        let original = square.clone();

        let mut contours = vec![square];
        snap_contours(&mut contours, 0.01);

        for p in &contours[0] {
            assert!(original.iter().any(|q| (p - q).norm() <= 1e-12));
        }
        for q in &original {
            let nearest = contours[0].iter().map(|p| (p - q).norm()).fold(f64::MAX, f64::min);
            assert!(nearest <= 0.01 + 1e-12, "{q} moved {nearest}");
        }
        assert!(contours[0].contains(&Point2::new(0.0, 10.0)));
        assert!(contours[0].contains(&Point2::new(10.0, 10.0)));
    }

    #[test]
    fn test_far_contours_untouched() {
        let original = vec![rect(0.0, 0.0, 1.0, 1.0), rect(2.0, 0.0, 3.0, 1.0)];
        let mut snapped = original.clone();
        snap_contours(&mut snapped, 0.01);
        assert_eq!(snapped, original);
    }
}
