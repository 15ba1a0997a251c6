//! Piecewise-linear interpolation over scattered 2-D data.
//!
//! Values are blended with barycentric weights of the Delaunay triangle
//! containing the query. Outside the convex hull of the sites there is no
//! triangle and [`LinearInterpolator::eval`] returns `None`; the
//! interpolator never extrapolates.

use crate::error::{Result, SurfaceError};
use crate::surface::delaunay::Triangulation;

/// Linear interpolant `z(x, y)` over scattered sites.
///
/// # Examples
/// ```
/// use volsurf_frames::surface::LinearInterpolator;
///
/// let xs = [0.0, 1.0, 0.0, 1.0];
/// let ys = [0.0, 0.0, 1.0, 1.0];
/// let zs = [0.0, 1.0, 1.0, 2.0]; // z = x + y
/// let interp = LinearInterpolator::new(&xs, &ys, &zs)?;
/// assert!((interp.eval(0.25, 0.5).unwrap() - 0.75).abs() < 1e-12);
/// assert_eq!(interp.eval(2.0, 0.5), None);
/// # Ok::<(), volsurf_frames::SurfaceError>(())
/// ```
#[derive(Debug)]
pub struct LinearInterpolator {
    triangulation: Triangulation,
    values: Vec<f64>,
}

impl LinearInterpolator {
    /// Fit the interpolant.
    ///
    /// Sites with identical coordinates are merged into one, carrying the
    /// mean of their values.
    ///
    /// # Errors
    /// Returns [`SurfaceError::InvalidInput`] for mismatched lengths or
    /// non-finite values, and [`SurfaceError::Degenerate`] when the distinct
    /// sites cannot be triangulated.
    pub fn new(xs: &[f64], ys: &[f64], zs: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() || xs.len() != zs.len() {
            return Err(SurfaceError::InvalidInput {
                message: format!(
                    "xs ({}), ys ({}) and zs ({}) must have the same length",
                    xs.len(),
                    ys.len(),
                    zs.len()
                ),
            });
        }
        if let Some(z) = zs.iter().find(|z| !z.is_finite()) {
            return Err(SurfaceError::InvalidInput {
                message: format!("values must be finite, got {z}"),
            });
        }

        let mut samples: Vec<(f64, f64, f64)> = xs
            .iter()
            .zip(ys)
            .zip(zs)
            .map(|((&x, &y), &z)| (x, y, z))
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let mut sites: Vec<[f64; 2]> = Vec::with_capacity(samples.len());
        let mut values: Vec<f64> = Vec::with_capacity(samples.len());
        let mut run = 0usize;
        for (x, y, z) in samples {
            match sites.last() {
                Some(last) if last[0] == x && last[1] == y => {
                    run += 1;
                    if let Some(v) = values.last_mut() {
                        // Running mean over the merged duplicates.
                        *v += (z - *v) / run as f64;
                    }
                }
                _ => {
                    sites.push([x, y]);
                    values.push(z);
                    run = 1;
                }
            }
        }

        let triangulation = Triangulation::new(&sites)?;
        Ok(Self {
            triangulation,
            values,
        })
    }

    /// Interpolated value at `(x, y)`, or `None` outside the convex hull.
    pub fn eval(&self, x: f64, y: f64) -> Option<f64> {
        let (t, w) = self.triangulation.locate(x, y)?;
        Some(w[0] * self.values[t[0]] + w[1] * self.values[t[1]] + w[2] * self.values[t[2]])
    }

    /// Whether `(x, y)` is inside the convex hull of the sites.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.triangulation.contains(x, y)
    }

    /// Number of distinct sites after merging duplicates.
    pub fn num_sites(&self) -> usize {
        self.triangulation.num_sites()
    }
}
