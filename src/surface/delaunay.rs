//! Incremental Delaunay triangulation of a planar point cloud.
//!
//! # Algorithm
//!
//! Sites are inserted in lexicographic order into a seed triangle. Each
//! insertion either splits the containing triangle (1 → 3), splits the edge
//! it lands on (2 → 4, or 1 → 2 on the hull), or extends the convex hull by
//! fanning to every visible hull edge. Lawson flips then restore the
//! empty-circumcircle property around the new site.
//!
//! There is no super-triangle, so the union of triangles is exactly the
//! convex hull of the input: queries outside it find no triangle and the
//! interpolator reports no value there.
//!
//! Coordinates are translated and divided by a single scale factor before
//! any predicate runs. A uniform rescale preserves circumcircle membership,
//! so the triangulation is the Delaunay triangulation of the raw sites while
//! the fixed tolerances below stay meaningful for any strike magnitude.
//!
//! Each site query is a linear scan over the triangles; buckets hold at most
//! a few hundred curve points, where that beats any index.

use std::collections::HashMap;

use nalgebra::{Matrix2, Matrix3, Vector2};

use crate::error::{Result, SurfaceError};

/// Orientation tolerance in normalized units.
const ORIENT_EPS: f64 = 1e-12;
/// In-circle tolerance: cocircular quads are left alone, which also
/// guarantees the flip loop terminates.
const CIRCLE_EPS: f64 = 1e-12;
/// Barycentric slack for points on a triangle boundary.
const BARY_EPS: f64 = 1e-9;

type Point = [f64; 2];

/// Twice the signed area of `abc`; positive when counter-clockwise.
fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Positive when `d` lies strictly inside the circumcircle of CCW `abc`.
fn in_circle(a: Point, b: Point, c: Point, d: Point) -> f64 {
    let row = |p: Point| {
        let dx = p[0] - d[0];
        let dy = p[1] - d[1];
        [dx, dy, dx * dx + dy * dy]
    };
    let (ra, rb, rc) = (row(a), row(b), row(c));
    Matrix3::new(
        ra[0], ra[1], ra[2], //
        rb[0], rb[1], rb[2], //
        rc[0], rc[1], rc[2],
    )
    .determinant()
}

/// The vertex of `t` that is neither `a` nor `b`.
fn third(t: [usize; 3], a: usize, b: usize) -> usize {
    t.into_iter().find(|&v| v != a && v != b).unwrap_or(t[0])
}

enum Location {
    Inside(usize),
    /// Triangle index and local edge index `k` (edge `t[k] → t[k+1]`).
    OnEdge(usize, usize),
    Vertex,
    Outside,
}

/// Triangles plus a directed-edge index (`(a, b)` → triangle holding `a → b`).
#[derive(Debug, Default)]
struct Mesh {
    triangles: Vec<[usize; 3]>,
    edges: HashMap<(usize, usize), usize>,
}

impl Mesh {
    fn tri_edges(t: [usize; 3]) -> [(usize, usize); 3] {
        [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])]
    }

    fn add(&mut self, t: [usize; 3]) -> usize {
        let idx = self.triangles.len();
        self.triangles.push(t);
        for e in Self::tri_edges(t) {
            self.edges.insert(e, idx);
        }
        idx
    }

    fn set(&mut self, idx: usize, t: [usize; 3]) {
        for e in Self::tri_edges(self.triangles[idx]) {
            if self.edges.get(&e) == Some(&idx) {
                self.edges.remove(&e);
            }
        }
        self.triangles[idx] = t;
        for e in Self::tri_edges(t) {
            self.edges.insert(e, idx);
        }
    }
}

/// Delaunay triangulation over a fixed set of sites.
#[derive(Debug)]
pub struct Triangulation {
    /// Sites in normalized coordinates, same order as the input.
    sites: Vec<Point>,
    triangles: Vec<[usize; 3]>,
    center: Point,
    scale: f64,
}

impl Triangulation {
    /// Triangulate `points`.
    ///
    /// Sites that coincide with an earlier site are absorbed (they add no
    /// triangle); callers that carry values should merge duplicates first.
    ///
    /// # Errors
    /// Returns [`SurfaceError::Degenerate`] for fewer than three sites or a
    /// collinear configuration, and [`SurfaceError::InvalidInput`] for
    /// non-finite coordinates.
    pub fn new(points: &[Point]) -> Result<Self> {
        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SurfaceError::InvalidInput {
                message: "triangulation sites must be finite".into(),
            });
        }
        if points.len() < 3 {
            return Err(SurfaceError::Degenerate {
                message: "at least 3 sites are required".into(),
                points: points.len(),
            });
        }

        let (mut lo, mut hi) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
        for p in points {
            for axis in 0..2 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
        }
        let center = [(lo[0] + hi[0]) / 2.0, (lo[1] + hi[1]) / 2.0];
        let scale = ((hi[0] - lo[0]).max(hi[1] - lo[1])) / 2.0;
        if scale <= 0.0 {
            return Err(SurfaceError::Degenerate {
                message: "all sites coincide".into(),
                points: points.len(),
            });
        }
        let sites: Vec<Point> = points
            .iter()
            .map(|p| [(p[0] - center[0]) / scale, (p[1] - center[1]) / scale])
            .collect();

        let mut order: Vec<usize> = (0..sites.len()).collect();
        order.sort_by(|&i, &j| {
            sites[i][0]
                .total_cmp(&sites[j][0])
                .then(sites[i][1].total_cmp(&sites[j][1]))
        });

        let i0 = order[0];
        let Some(second) = order.iter().position(|&k| sites[k] != sites[i0]) else {
            return Err(SurfaceError::Degenerate {
                message: "all sites coincide".into(),
                points: points.len(),
            });
        };
        let i1 = order[second];
        let Some(seed_pos) = order
            .iter()
            .skip(second + 1)
            .position(|&k| orient(sites[i0], sites[i1], sites[k]).abs() > ORIENT_EPS)
            .map(|p| p + second + 1)
        else {
            return Err(SurfaceError::Degenerate {
                message: "all sites are collinear".into(),
                points: points.len(),
            });
        };
        let i2 = order[seed_pos];

        let mut mesh = Mesh::default();
        if orient(sites[i0], sites[i1], sites[i2]) > 0.0 {
            mesh.add([i0, i1, i2]);
        } else {
            mesh.add([i0, i2, i1]);
        }

        for (pos, &idx) in order.iter().enumerate() {
            if pos == 0 || pos == second || pos == seed_pos {
                continue;
            }
            insert(&mut mesh, &sites, idx);
        }

        Ok(Self {
            sites,
            triangles: mesh.triangles,
            center,
            scale,
        })
    }

    /// Triangles as CCW triples of input site indices.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Number of input sites.
    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    fn normalize(&self, x: f64, y: f64) -> Point {
        [(x - self.center[0]) / self.scale, (y - self.center[1]) / self.scale]
    }

    /// Containing triangle and barycentric weights of `(x, y)`, or `None`
    /// outside the convex hull.
    pub fn locate(&self, x: f64, y: f64) -> Option<([usize; 3], [f64; 3])> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let q = self.normalize(x, y);
        self.triangles.iter().find_map(|&t| {
            let w = barycentric(self.sites[t[0]], self.sites[t[1]], self.sites[t[2]], q)?;
            w.iter().all(|&l| l >= -BARY_EPS).then_some((t, w))
        })
    }

    /// Whether `(x, y)` lies in the triangulated region (the convex hull).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.locate(x, y).is_some()
    }
}

/// Barycentric weights of `q` in triangle `abc` via a 2×2 solve.
fn barycentric(a: Point, b: Point, c: Point, q: Point) -> Option<[f64; 3]> {
    let m = Matrix2::new(b[0] - a[0], c[0] - a[0], b[1] - a[1], c[1] - a[1]);
    let rhs = Vector2::new(q[0] - a[0], q[1] - a[1]);
    let l = m.lu().solve(&rhs)?;
    Some([1.0 - l[0] - l[1], l[0], l[1]])
}

fn locate_site(mesh: &Mesh, sites: &[Point], p: Point) -> Location {
    for (i, t) in mesh.triangles.iter().enumerate() {
        let o = [
            orient(sites[t[0]], sites[t[1]], p),
            orient(sites[t[1]], sites[t[2]], p),
            orient(sites[t[2]], sites[t[0]], p),
        ];
        if o.iter().all(|&v| v > -ORIENT_EPS) {
            let mut on_edges = (0..3).filter(|&k| o[k].abs() <= ORIENT_EPS);
            return match (on_edges.next(), on_edges.next()) {
                (None, _) => Location::Inside(i),
                (Some(k), None) => Location::OnEdge(i, k),
                (Some(_), Some(_)) => Location::Vertex,
            };
        }
    }
    Location::Outside
}

fn insert(mesh: &mut Mesh, sites: &[Point], p: usize) {
    match locate_site(mesh, sites, sites[p]) {
        Location::Inside(i) => {
            let [a, b, c] = mesh.triangles[i];
            mesh.set(i, [a, b, p]);
            mesh.add([b, c, p]);
            mesh.add([c, a, p]);
            legalize(mesh, sites, p, &[(a, b), (b, c), (c, a)]);
        }
        Location::OnEdge(i, k) => {
            let t = mesh.triangles[i];
            let (a, b, c) = (t[k], t[(k + 1) % 3], t[(k + 2) % 3]);
            let opposite = mesh.edges.get(&(b, a)).copied();
            mesh.set(i, [a, p, c]);
            mesh.add([p, b, c]);
            let mut pending = vec![(c, a), (b, c)];
            if let Some(j) = opposite {
                let d = third(mesh.triangles[j], b, a);
                mesh.set(j, [b, p, d]);
                mesh.add([p, a, d]);
                pending.extend([(d, b), (a, d)]);
            }
            legalize(mesh, sites, p, &pending);
        }
        Location::Vertex => {}
        Location::Outside => {
            let mut visible: Vec<(usize, usize)> = mesh
                .edges
                .keys()
                .copied()
                .filter(|&(a, b)| {
                    !mesh.edges.contains_key(&(b, a))
                        && orient(sites[a], sites[b], sites[p]) < -ORIENT_EPS
                })
                .collect();
            visible.sort_unstable();
            for &(a, b) in &visible {
                mesh.add([b, a, p]);
            }
            let pending: Vec<(usize, usize)> = visible.iter().map(|&(a, b)| (b, a)).collect();
            legalize(mesh, sites, p, &pending);
        }
    }
}

/// Lawson flips around `p`. Each pending `(x, y)` names a triangle
/// `(x, y, p)`; its edge `x → y` is flipped when the opposite apex falls
/// inside the circumcircle.
fn legalize(mesh: &mut Mesh, sites: &[Point], p: usize, pending: &[(usize, usize)]) {
    let mut stack = pending.to_vec();
    while let Some((x, y)) = stack.pop() {
        let Some(&ti) = mesh.edges.get(&(x, y)) else {
            continue;
        };
        if third(mesh.triangles[ti], x, y) != p {
            continue;
        }
        let Some(&tj) = mesh.edges.get(&(y, x)) else {
            continue;
        };
        let d = third(mesh.triangles[tj], y, x);
        if in_circle(sites[x], sites[y], sites[p], sites[d]) > CIRCLE_EPS {
            mesh.set(ti, [x, d, p]);
            mesh.set(tj, [d, y, p]);
            stack.push((x, d));
            stack.push((d, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(tri: &Triangulation, pts: &[Point]) -> f64 {
        tri.triangles()
            .iter()
            .map(|t| orient(pts[t[0]], pts[t[1]], pts[t[2]]) / 2.0)
            .sum()
    }

    #[test]
    fn unit_square_gives_two_ccw_triangles() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let tri = Triangulation::new(&pts).unwrap();
        assert_eq!(tri.triangles().len(), 2);
        for t in tri.triangles() {
            assert!(orient(pts[t[0]], pts[t[1]], pts[t[2]]) > 0.0);
        }
        assert!((area(&tri, &pts) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn regular_grid_covers_its_hull() {
        // 5 × 4 lattice: lots of cocircular quads.
        let pts: Vec<Point> = (0..5)
            .flat_map(|i| (0..4).map(move |j| [440.0 + 5.0 * i as f64, 7.0 * (j + 1) as f64]))
            .collect();
        let tri = Triangulation::new(&pts).unwrap();
        assert_eq!(tri.triangles().len(), 2 * 4 * 3);
        assert!((area(&tri, &pts) - 20.0 * 21.0).abs() < 1e-6);
    }

    #[test]
    fn triangulation_is_delaunay() {
        let pts: Vec<Point> = vec![
            [430.0, 3.0],
            [437.0, 10.0],
            [441.0, 4.0],
            [446.0, 17.0],
            [452.0, 8.0],
            [458.0, 30.0],
            [462.0, 2.0],
            [449.0, 24.0],
            [435.0, 28.0],
        ];
        let tri = Triangulation::new(&pts).unwrap();
        for t in tri.triangles() {
            for (k, p) in tri.sites.iter().enumerate() {
                if t.contains(&k) {
                    continue;
                }
                let s = &tri.sites;
                assert!(
                    in_circle(s[t[0]], s[t[1]], s[t[2]], *p) <= CIRCLE_EPS,
                    "site {k} inside circumcircle of {t:?}"
                );
            }
        }
        assert!(!tri.triangles().is_empty());
        assert_eq!(tri.num_sites(), pts.len());
    }

    #[test]
    fn collinear_sites_are_degenerate() {
        let pts = [[440.0, 10.0], [445.0, 10.0], [450.0, 10.0], [455.0, 10.0]];
        match Triangulation::new(&pts) {
            Err(SurfaceError::Degenerate { points, .. }) => assert_eq!(points, 4),
            other => panic!("expected Degenerate, got {other:?}"),
        }
    }

    #[test]
    fn diagonal_collinear_is_degenerate() {
        let pts = [[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0], [5.0, 5.0]];
        assert!(matches!(
            Triangulation::new(&pts),
            Err(SurfaceError::Degenerate { .. })
        ));
    }

    #[test]
    fn too_few_sites_are_degenerate() {
        assert!(matches!(
            Triangulation::new(&[[0.0, 0.0], [1.0, 1.0]]),
            Err(SurfaceError::Degenerate { .. })
        ));
    }

    #[test]
    fn collinear_prefix_then_offset_site() {
        // First three sorted sites are collinear; the seed must skip ahead.
        let pts = [[0.0, 0.0], [0.0, 1.0], [0.0, 2.0], [0.0, 3.0], [2.0, 1.5]];
        let tri = Triangulation::new(&pts).unwrap();
        assert_eq!(tri.triangles().len(), 3);
        assert!((area(&tri, &pts) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_sites_are_absorbed() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0]];
        let tri = Triangulation::new(&pts).unwrap();
        assert_eq!(tri.triangles().len(), 1);

        let leading = [[0.0, 0.0], [0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let tri = Triangulation::new(&leading).unwrap();
        assert_eq!(tri.triangles().len(), 1);
    }

    #[test]
    fn locate_inside_and_outside() {
        let pts = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
        let tri = Triangulation::new(&pts).unwrap();
        let (_, w) = tri.locate(1.0, 1.0).unwrap();
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(tri.contains(2.0, 2.0)); // on the hypotenuse
        assert!(tri.contains(0.0, 0.0)); // vertex
        assert!(!tri.contains(3.0, 3.0));
        assert!(!tri.contains(-0.1, 1.0));
        assert!(!tri.contains(f64::NAN, 1.0));
    }

    #[test]
    fn non_finite_site_rejected() {
        let pts = [[0.0, 0.0], [1.0, f64::NAN], [0.0, 1.0]];
        assert!(matches!(
            Triangulation::new(&pts),
            Err(SurfaceError::InvalidInput { .. })
        ));
    }
}
