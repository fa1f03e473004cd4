use std::collections::HashMap;

use log::{debug, warn};
use ndarray::Array2;

use crate::error::{PlotError, Result};

/// Sweep-hull triangulation made Delaunay by edge flips. Triangles are
/// counter-clockwise.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<(f64, f64)>,
    sources: Vec<usize>,
    triangles: Vec<[usize; 3]>,
}

const EPS: f64 = 1e-12;

impl Triangulation {
    pub fn new(samples: &[(f64, f64)]) -> Result<Self> {
        let degenerate = || PlotError::DegenerateSelection {
            samples: samples.len(),
        };
        if samples.len() < 3 {
            return Err(degenerate());
        }

        let (min_x, max_x, min_y, max_y) = samples.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(x0, x1, y0, y1), &(x, y)| (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
        );
        let scale = (max_x - min_x).max(max_y - min_y);
        if !scale.is_finite() || scale <= 0.0 {
            return Err(degenerate());
        }

        let mut order: Vec<usize> = (0..samples.len()).collect();
        order.sort_by(|&a, &b| {
            samples[a]
                .0
                .total_cmp(&samples[b].0)
                .then(samples[a].1.total_cmp(&samples[b].1))
                .then(a.cmp(&b))
        });

        // Work in the unit square.
        let mut points: Vec<(f64, f64)> = Vec::with_capacity(samples.len());
        let mut sources: Vec<usize> = Vec::with_capacity(samples.len());
        for index in order {
            let (x, y) = samples[index];
            let p = ((x - min_x) / scale, (y - min_y) / scale);
            if let Some(&last) = points.last() {
                if same_point(last, p) {
                    warn!(
                        "Sample {index} at {:?} duplicates sample {}, ignored",
                        samples[index],
                        sources[sources.len() - 1]
                    );
                    continue;
                }
            }
            points.push(p);
            sources.push(index);
        }

        let mut triangles = sweep(&points).ok_or_else(degenerate)?;
        let flips = make_delaunay(&points, &mut triangles);
        debug!(
            "Triangulated {} samples into {} triangles ({flips} flips)",
            samples.len(),
            triangles.len()
        );

        let points = points
            .iter()
            .map(|&(x, y)| (x * scale + min_x, y * scale + min_y))
            .collect();

        Ok(Self {
            points,
            sources,
            triangles,
        })
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Linear interpolation of `values` (one per input sample) onto the grid
    /// spanned by `xi` and `yi`, shaped `(yi.len(), xi.len())`. Nodes outside
    /// the convex hull of the samples are `None`.
    pub fn griddata_linear(&self, values: &[f64], xi: &[f64], yi: &[f64]) -> Array2<Option<f64>> {
        let mut grid = Array2::from_elem((yi.len(), xi.len()), None);

        for triangle in &self.triangles {
            let [a, b, c] = triangle.map(|v| self.points[v]);
            let [za, zb, zc] = triangle.map(|v| values[self.sources[v]]);

            let det = (b.1 - c.1) * (a.0 - c.0) + (c.0 - b.0) * (a.1 - c.1);
            if det.abs() <= f64::EPSILON {
                continue;
            }
            let (lo_x, hi_x) = (a.0.min(b.0).min(c.0), a.0.max(b.0).max(c.0));
            let (lo_y, hi_y) = (a.1.min(b.1).min(c.1), a.1.max(b.1).max(c.1));
            let tol = 1e-10 * ((hi_x - lo_x) + (hi_y - lo_y));

            let columns = index_range(xi, lo_x - tol, hi_x + tol);
            let rows = index_range(yi, lo_y - tol, hi_y + tol);
            let eps = 1e-9;

            for j in rows {
                let y = yi[j];
                for i in columns.clone() {
                    if grid[[j, i]].is_some() {
                        continue;
                    }
                    let x = xi[i];
                    let l1 = ((b.1 - c.1) * (x - c.0) + (c.0 - b.0) * (y - c.1)) / det;
                    let l2 = ((c.1 - a.1) * (x - c.0) + (a.0 - c.0) * (y - c.1)) / det;
                    let l3 = 1.0 - l1 - l2;
                    if l1 >= -eps && l2 >= -eps && l3 >= -eps {
                        grid[[j, i]] = Some(l1 * za + l2 * zb + l3 * zc);
                    }
                }
            }
        }

        grid
    }
}

fn same_point(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() < EPS && (a.1 - b.1).abs() < EPS
}

fn index_range(axis: &[f64], lo: f64, hi: f64) -> std::ops::Range<usize> {
    let start = axis.partition_point(|&v| v < lo);
    let end = axis.partition_point(|&v| v <= hi);
    start..end.max(start)
}

fn orientation(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn in_circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    let (adx, ady) = (a.0 - d.0, a.1 - d.1);
    let (bdx, bdy) = (b.0 - d.0, b.1 - d.1);
    let (cdx, cdy) = (c.0 - d.0, c.1 - d.1);
    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;
    let det = adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx) + ad * (bdx * cdy - bdy * cdx);
    det > EPS
}

/// Triangulates points sorted by x then y, covering their whole convex hull.
/// Returns `None` when all points are collinear.
fn sweep(points: &[(f64, f64)]) -> Option<Vec<[usize; 3]>> {
    if points.len() < 3 {
        return None;
    }
    let first = (2..points.len())
        .find(|&k| orientation(points[0], points[1], points[k]).abs() > EPS)?;
    let apex = points[first];

    // Fan from the first off-line point over the collinear run before it.
    let mut triangles = Vec::new();
    let mut hull: Vec<usize> = if orientation(points[0], points[1], apex) > 0.0 {
        triangles.extend((0..first - 1).map(|i| [i, i + 1, first]));
        (0..=first).collect()
    } else {
        triangles.extend((0..first - 1).map(|i| [i + 1, i, first]));
        (0..first).rev().chain([first]).collect()
    };

    for p in first + 1..points.len() {
        let n = hull.len();
        let visible: Vec<bool> = (0..n)
            .map(|i| orientation(points[hull[i]], points[hull[(i + 1) % n]], points[p]) < -EPS)
            .collect();
        let Some(start) = (0..n).find(|&i| visible[i] && !visible[(i + n - 1) % n]) else {
            warn!("Point {p} lies on the hull, skipped");
            continue;
        };
        let count = (0..n).take_while(|&k| visible[(start + k) % n]).count();

        for k in 0..count {
            let u = hull[(start + k) % n];
            let v = hull[(start + k + 1) % n];
            triangles.push([v, u, p]);
        }

        let mut next: Vec<usize> = (0..=n - count)
            .map(|k| hull[(start + count + k) % n])
            .collect();
        next.push(p);
        hull = next;
    }

    Some(triangles)
}

fn make_delaunay(points: &[(f64, f64)], triangles: &mut [[usize; 3]]) -> usize {
    let mut owner: HashMap<(usize, usize), usize> = HashMap::new();
    for (t, tri) in triangles.iter().enumerate() {
        for e in 0..3 {
            owner.insert((tri[e], tri[(e + 1) % 3]), t);
        }
    }

    let max_flips = 4 * triangles.len() * triangles.len() + 16;
    let mut flips = 0;
    loop {
        let mut changed = false;
        for t in 0..triangles.len() {
            for e in 0..3 {
                let [a, b, c] = [0, 1, 2].map(|k| triangles[t][(e + k) % 3]);
                let Some(&u) = owner.get(&(b, a)) else {
                    continue;
                };
                let Some(&d) = triangles[u].iter().find(|&&v| v != a && v != b) else {
                    continue;
                };
                let (pa, pb, pc, pd) = (points[a], points[b], points[c], points[d]);
                if !in_circumcircle(pa, pb, pc, pd)
                    || orientation(pa, pd, pc) <= EPS
                    || orientation(pd, pb, pc) <= EPS
                {
                    continue;
                }

                for tri in [triangles[t], triangles[u]] {
                    for k in 0..3 {
                        owner.remove(&(tri[k], tri[(k + 1) % 3]));
                    }
                }
                triangles[t] = [a, d, c];
                triangles[u] = [d, b, c];
                for index in [t, u] {
                    let tri = triangles[index];
                    for k in 0..3 {
                        owner.insert((tri[k], tri[(k + 1) % 3]), index);
                    }
                }

                flips += 1;
                changed = true;
                break;
            }
        }
        if !changed {
            break;
        }
        if flips > max_flips {
            warn!("Stopped edge flipping after {flips} flips");
            break;
        }
    }
    flips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::linspace;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn hull(samples: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut pts = samples.to_vec();
        pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        pts.dedup();
        let mut lower: Vec<(f64, f64)> = Vec::new();
        for &p in &pts {
            while lower.len() >= 2 && orientation(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
                lower.pop();
            }
            lower.push(p);
        }
        let mut upper: Vec<(f64, f64)> = Vec::new();
        for &p in pts.iter().rev() {
            while upper.len() >= 2 && orientation(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
                upper.pop();
            }
            upper.push(p);
        }
        lower.pop();
        upper.pop();
        lower.extend(upper);
        lower
    }

    fn polygon_area(polygon: &[(f64, f64)]) -> f64 {
        let n = polygon.len();
        (0..n)
            .map(|i| {
                let (a, b) = (polygon[i], polygon[(i + 1) % n]);
                a.0 * b.1 - b.0 * a.1
            })
            .sum::<f64>()
            / 2.0
    }

    fn random_wall(rng: &mut StdRng, n: usize) -> Vec<(f64, f64)> {
        (0..n)
            .map(|_| {
                (
                    rng.random_range(0..300) as f64,
                    rng.random_range(0..=250) as f64,
                )
            })
            .collect()
    }

    fn corners() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (100.0, 0.0), (0.0, 250.0), (100.0, 250.0)]
    }

    #[test]
    fn square_splits_into_two_triangles() {
        let tri = Triangulation::new(&corners()).unwrap();
        assert_eq!(tri.triangles().len(), 2);
        for t in tri.triangles() {
            let [a, b, c] = t.map(|v| tri.points()[v]);
            assert!(orientation(a, b, c) > 0.0);
        }
    }

    #[test]
    fn too_few_or_collinear_points_are_rejected() {
        assert!(matches!(
            Triangulation::new(&[]),
            Err(PlotError::DegenerateSelection { samples: 0 })
        ));
        assert!(matches!(
            Triangulation::new(&[(0.0, 0.0), (1.0, 1.0)]),
            Err(PlotError::DegenerateSelection { samples: 2 })
        ));
        assert!(matches!(
            Triangulation::new(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (30.0, 30.0)]),
            Err(PlotError::DegenerateSelection { samples: 4 })
        ));
        assert!(matches!(
            Triangulation::new(&[(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)]),
            Err(PlotError::DegenerateSelection { .. })
        ));
    }

    #[test]
    fn duplicates_keep_first_sample() {
        let mut samples = corners();
        samples.insert(1, (0.0, 0.0));
        let tri = Triangulation::new(&samples).unwrap();
        assert_eq!(tri.points().len(), 4);
        let grid = tri.griddata_linear(&[1.0, 99.0, 1.0, 1.0, 1.0], &[0.0], &[0.0]);
        assert_eq!(grid[[0, 0]], Some(1.0));
    }

    #[test]
    fn reproduces_linear_field() {
        let samples = vec![
            (0.0, 0.0),
            (80.0, 10.0),
            (35.0, 200.0),
            (120.0, 240.0),
            (60.0, 90.0),
            (10.0, 150.0),
        ];
        let field = |(x, y): (f64, f64)| 3.0 + 0.5 * x - 0.2 * y;
        let values: Vec<f64> = samples.iter().copied().map(field).collect();
        let tri = Triangulation::new(&samples).unwrap();

        let xi = linspace(0.0, 120.0, 61);
        let yi = linspace(0.0, 250.0, 51);
        let grid = tri.griddata_linear(&values, &xi, &yi);
        assert_eq!(grid.dim(), (51, 61));

        let mut defined = 0;
        for ((j, i), cell) in grid.indexed_iter() {
            if let Some(v) = cell {
                defined += 1;
                assert!((v - field((xi[i], yi[j]))).abs() < 1e-9);
            }
        }
        assert!(defined > 0);
        // Sample positions themselves are inside the hull.
        assert!(grid[[0, 0]].is_some());
    }

    #[test]
    fn nodes_outside_hull_are_missing() {
        let samples = vec![(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)];
        let tri = Triangulation::new(&samples).unwrap();
        let xi = linspace(0.0, 100.0, 11);
        let grid = tri.griddata_linear(&[0.0, 1.0, 2.0], &xi, &xi);
        assert!(grid[[10, 10]].is_none());
        assert!(grid[[9, 9]].is_none());
        assert!(grid[[5, 5]].is_some());
        assert!(grid[[0, 10]].is_some());
        assert!(grid[[10, 0]].is_some());
    }

    #[test]
    fn irregular_samples_cover_their_hull() {
        let mut rng = StdRng::seed_from_u64(17);
        for set in 0..50 {
            let samples = random_wall(&mut rng, 40);
            let tri = Triangulation::new(&samples).unwrap();

            let covered: f64 = tri
                .triangles()
                .iter()
                .map(|t| {
                    let [a, b, c] = t.map(|v| tri.points()[v]);
                    assert!(orientation(a, b, c) > 0.0, "set {set}: flat or clockwise triangle");
                    orientation(a, b, c) / 2.0
                })
                .sum();
            let outline = hull(&samples);
            let area = polygon_area(&outline);
            assert!(
                (covered - area).abs() < 1e-6 * area,
                "set {set}: hull {area} triangulated {covered}"
            );

            // Nodes inside the hull get the interpolated linear field.
            let field = |(x, y): (f64, f64)| 12.0 + 0.3 * x + 0.1 * y;
            let values: Vec<f64> = samples.iter().copied().map(field).collect();
            let xi = linspace(0.0, 300.0, 121);
            let yi = linspace(0.0, 250.0, 101);
            let grid = tri.griddata_linear(&values, &xi, &yi);
            for ((j, i), cell) in grid.indexed_iter() {
                let node = (xi[i], yi[j]);
                let n = outline.len();
                let inside = (0..n).all(|k| orientation(outline[k], outline[(k + 1) % n], node) > 1e-6);
                if inside {
                    let v = cell.unwrap_or_else(|| panic!("set {set}: hole at {node:?}"));
                    assert!((v - field(node)).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn triangles_are_delaunay() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let samples = random_wall(&mut rng, 30);
            let tri = Triangulation::new(&samples).unwrap();
            let pts = tri.points();
            // Compare in unit-square coordinates like the construction does.
            let unit = |p: (f64, f64)| (p.0 / 300.0, p.1 / 300.0);
            for t in tri.triangles() {
                let [a, b, c] = t.map(|v| unit(pts[v]));
                for (k, &p) in pts.iter().enumerate() {
                    if t.contains(&k) {
                        continue;
                    }
                    let (adx, ady) = (a.0 - unit(p).0, a.1 - unit(p).1);
                    let (bdx, bdy) = (b.0 - unit(p).0, b.1 - unit(p).1);
                    let (cdx, cdy) = (c.0 - unit(p).0, c.1 - unit(p).1);
                    let det = (adx * adx + ady * ady) * (bdx * cdy - bdy * cdx)
                        - (bdx * bdx + bdy * bdy) * (adx * cdy - ady * cdx)
                        + (cdx * cdx + cdy * cdy) * (adx * bdy - ady * bdx);
                    assert!(det < 1e-9, "point {k} inside circumcircle of {t:?}");
                }
            }
        }
    }

    #[test]
    fn thin_bottom_row_is_covered() {
        let samples = vec![
            (0.0, 0.0),
            (40.0, 1.0),
            (80.0, 0.0),
            (120.0, 1.0),
            (160.0, 0.0),
            (200.0, 2.0),
            (100.0, 250.0),
        ];
        let tri = Triangulation::new(&samples).unwrap();
        let covered: f64 = tri
            .triangles()
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|v| tri.points()[v]);
                orientation(a, b, c) / 2.0
            })
            .sum();
        let area = polygon_area(&hull(&samples));
        assert!((covered - area).abs() < 1e-6 * area);

        let grid = tri.griddata_linear(&[0.0; 7], &[59.6], &[2.51]);
        assert_eq!(grid[[0, 0]], Some(0.0));
    }
}
