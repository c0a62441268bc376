//! Covariance-weighted straight-line fit through layered hits.
//!
//! The line is `u(z) = u0 + su * z`, `v(z) = v0 + sv * z` in the chamber
//! frame. Each hit contributes `A^T W A` to the normal matrix and `A^T W m`
//! to the right-hand side, with `A = [[1, 0, z, 0], [0, 1, 0, z]]`, `W` the
//! hit's weight matrix and `m = (u, v)`.

use crate::chamber_hit::ChamberHit;
use nalgebra::{Matrix2x4, Matrix4, Point3, Vector2, Vector3, Vector4};

/// Parameters of a straight line in the chamber frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineParams {
    /// u at depth zero.
    pub intercept_u: f64,
    /// v at depth zero.
    pub intercept_v: f64,
    /// du/dz.
    pub slope_u: f64,
    /// dv/dz.
    pub slope_v: f64,
}

impl LineParams {
    /// Creates a line from its intercepts and slopes.
    #[must_use]
    pub fn new(intercept_u: f64, intercept_v: f64, slope_u: f64, slope_v: f64) -> Self {
        Self {
            intercept_u,
            intercept_v,
            slope_u,
            slope_v,
        }
    }

    /// Parameters in fit order `(u0, v0, su, sv)`.
    #[must_use]
    pub fn to_vector(&self) -> Vector4<f64> {
        Vector4::new(self.intercept_u, self.intercept_v, self.slope_u, self.slope_v)
    }

    /// Builds parameters from fit order `(u0, v0, su, sv)`.
    #[must_use]
    pub fn from_vector(p: &Vector4<f64>) -> Self {
        Self::new(p[0], p[1], p[2], p[3])
    }

    /// Point on the line at depth `z`.
    #[inline]
    #[must_use]
    pub fn at(&self, z: f64) -> Point3<f64> {
        Point3::new(
            self.intercept_u + self.slope_u * z,
            self.intercept_v + self.slope_v * z,
            z,
        )
    }

    /// Point on the line at depth zero.
    #[inline]
    #[must_use]
    pub fn intercept(&self) -> Point3<f64> {
        self.at(0.0)
    }

    /// Unit direction with a positive depth component.
    #[must_use]
    pub fn direction(&self) -> Vector3<f64> {
        let dz = 1.0 / (1.0 + self.slope_u * self.slope_u + self.slope_v * self.slope_v).sqrt();
        Vector3::new(dz * self.slope_u, dz * self.slope_v, dz)
    }

    /// Residual `(line - hit)` at the hit's depth.
    #[inline]
    #[must_use]
    pub fn residual(&self, hit: &ChamberHit) -> Vector2<f64> {
        let predicted = self.at(hit.depth());
        Vector2::new(predicted.x - hit.chamber.x, predicted.y - hit.chamber.y)
    }
}

/// Outcome of a line fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineFit {
    /// Fitted (or retained) parameters.
    pub line: LineParams,
    /// Weighted chi-square of `line` over the fitted hits.
    pub chi2: f64,
    /// False when the normal equations were singular and `line` is the
    /// previous estimate.
    pub solved: bool,
}

/// Design matrix rows of a hit at depth `z`.
#[inline]
pub(crate) fn design_rows(z: f64) -> Matrix2x4<f64> {
    Matrix2x4::new(1.0, 0.0, z, 0.0, 0.0, 1.0, 0.0, z)
}

/// Accumulates the 4x4 normal matrix and right-hand side.
#[must_use]
pub fn normal_equations<'a, I>(hits: I) -> (Matrix4<f64>, Vector4<f64>)
where
    I: IntoIterator<Item = &'a ChamberHit>,
{
    let mut m = Matrix4::zeros();
    let mut b = Vector4::zeros();
    for hit in hits {
        let a = design_rows(hit.depth());
        let at_w = a.transpose() * hit.weight;
        let meas = Vector2::new(hit.chamber.x, hit.chamber.y);
        m += at_w * a;
        b += at_w * meas;
    }
    (m, b)
}

/// Solves the normal equations. `None` if they are singular.
#[must_use]
pub fn solve_line<'a, I>(hits: I) -> Option<LineParams>
where
    I: IntoIterator<Item = &'a ChamberHit>,
{
    let (m, b) = normal_equations(hits);
    let p = m.lu().solve(&b)?;
    if p.iter().all(|v| v.is_finite()) {
        Some(LineParams::from_vector(&p))
    } else {
        None
    }
}

/// Weighted chi-square of `line` over `hits`.
#[must_use]
pub fn chi_squared<'a, I>(line: &LineParams, hits: I) -> f64
where
    I: IntoIterator<Item = &'a ChamberHit>,
{
    hits.into_iter()
        .map(|hit| {
            let r = line.residual(hit);
            (r.transpose() * hit.weight * r)[(0, 0)]
        })
        .sum()
}

/// Fits a line through `hits`, keeping `previous` if the system is singular.
#[must_use]
pub fn fit_line(hits: &[&ChamberHit], previous: &LineParams) -> LineFit {
    let (line, solved) = match solve_line(hits.iter().copied()) {
        Some(line) => (line, true),
        None => (*previous, false),
    };
    let chi2 = chi_squared(&line, hits.iter().copied());
    LineFit { line, chi2, solved }
}
