//! B-spline curves and surfaces.
//!
//! Stored kernel-style: degree, distinct knots with multiplicities, poles,
//! optional per-pole weights (`None` = non-rational), periodicity flags.
//! Evaluation of a periodic spline is defined through its de-periodized
//! form, so export and evaluation can never disagree about geometry.

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{Result, ShapeIoError};

/// A B-spline curve in 3D.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineCurve {
    degree: usize,
    periodic: bool,
    knots: Vec<f64>,
    mults: Vec<usize>,
    poles: Vec<Point3<f64>>,
    weights: Option<Vec<f64>>,
}

impl BSplineCurve {
    /// Creates a curve, validating the knot law:
    ///
    /// - knots strictly increasing, one multiplicity per knot
    /// - non-periodic: `sum(mults) == poles + degree + 1`
    /// - periodic: `mults[0] == mults[last]` and
    ///   `sum(mults) - mults[last] == poles`
    pub fn new(
        degree: usize,
        knots: Vec<f64>,
        mults: Vec<usize>,
        poles: Vec<Point3<f64>>,
        weights: Option<Vec<f64>>,
        periodic: bool,
    ) -> Result<Self> {
        validate_direction(degree, &knots, &mults, poles.len(), periodic)?;
        if let Some(ws) = &weights {
            validate_weights(ws, poles.len())?;
        }
        Ok(Self {
            degree,
            periodic,
            knots,
            mults,
            poles,
            weights,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    pub fn poles(&self) -> &[Point3<f64>] {
        &self.poles
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn multiplicities(&self) -> &[usize] {
        &self.mults
    }

    /// Per-pole weights, filling in 1.0 for a non-rational curve.
    pub fn effective_weights(&self) -> Vec<f64> {
        match &self.weights {
            Some(ws) => ws.clone(),
            None => vec![1.0; self.poles.len()],
        }
    }

    /// The unrolled knot vector: each distinct knot repeated by its
    /// multiplicity.
    pub fn knot_sequence(&self) -> Vec<f64> {
        unroll(&self.knots, &self.mults)
    }

    pub fn first_parameter(&self) -> f64 {
        if self.periodic {
            self.knots[0]
        } else {
            self.knot_sequence()[self.degree]
        }
    }

    pub fn last_parameter(&self) -> f64 {
        if self.periodic {
            self.knots[self.knots.len() - 1]
        } else {
            let flat = self.knot_sequence();
            flat[flat.len() - 1 - self.degree]
        }
    }

    /// Returns an equivalent non-periodic curve over the same parameter
    /// range. Poles are extended cyclically by `degree`; the knot vector is
    /// extended with period-shifted copies at both ends. A non-periodic
    /// curve is returned unchanged.
    pub fn set_not_periodic(&self) -> BSplineCurve {
        if !self.periodic {
            return self.clone();
        }
        let (knots, mults, take) =
            unwrap_periodic(&self.knots, &self.mults, self.poles.len(), self.degree);
        let poles = take.iter().map(|&i| self.poles[i]).collect();
        let weights = self
            .weights
            .as_ref()
            .map(|ws| take.iter().map(|&i| ws[i]).collect());
        // the unwrap satisfies the non-periodic knot law by construction
        debug_assert_eq!(
            mults.iter().sum::<usize>(),
            self.poles.len() + 2 * self.degree + 1
        );
        BSplineCurve {
            degree: self.degree,
            periodic: false,
            knots,
            mults,
            poles,
            weights,
        }
    }

    /// Evaluates the curve. Parameters clamp to the domain.
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        if self.periodic {
            // evaluation is defined through the de-periodized form
            return self.set_not_periodic().point_at(t);
        }
        let flat = self.knot_sequence();
        let t = t.clamp(self.first_parameter(), self.last_parameter());
        let hpoles = homogeneous(&self.poles, self.weights.as_deref());
        let h = de_boor(&flat, &hpoles, self.degree, t);
        dehomogenize(h)
    }

    /// Applies a rigid transform to the defining poles.
    pub fn transformed(&self, trsf: &crate::geom::Trsf) -> BSplineCurve {
        let mut out = self.clone();
        for p in &mut out.poles {
            *p = trsf.transform_point(p);
        }
        out
    }
}

/// A B-spline surface in 3D. Poles are stored row-major: `poles[i][j]` is
/// the pole at U index `i`, V index `j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineSurface {
    u_degree: usize,
    v_degree: usize,
    u_periodic: bool,
    v_periodic: bool,
    u_knots: Vec<f64>,
    v_knots: Vec<f64>,
    u_mults: Vec<usize>,
    v_mults: Vec<usize>,
    poles: Vec<Vec<Point3<f64>>>,
    weights: Option<Vec<Vec<f64>>>,
}

impl BSplineSurface {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        u_degree: usize,
        v_degree: usize,
        u_knots: Vec<f64>,
        v_knots: Vec<f64>,
        u_mults: Vec<usize>,
        v_mults: Vec<usize>,
        poles: Vec<Vec<Point3<f64>>>,
        weights: Option<Vec<Vec<f64>>>,
        u_periodic: bool,
        v_periodic: bool,
    ) -> Result<Self> {
        let n_u = poles.len();
        let n_v = poles.first().map(Vec::len).unwrap_or(0);
        if n_u == 0 || n_v == 0 {
            return Err(ShapeIoError::InvalidGeometry(
                "surface needs a non-empty pole grid".to_string(),
            ));
        }
        if poles.iter().any(|row| row.len() != n_v) {
            return Err(ShapeIoError::InvalidGeometry(
                "surface pole grid is ragged".to_string(),
            ));
        }
        validate_direction(u_degree, &u_knots, &u_mults, n_u, u_periodic)?;
        validate_direction(v_degree, &v_knots, &v_mults, n_v, v_periodic)?;
        if let Some(ws) = &weights {
            if ws.len() != n_u || ws.iter().any(|row| row.len() != n_v) {
                return Err(ShapeIoError::InvalidGeometry(
                    "surface weight grid does not match the pole grid".to_string(),
                ));
            }
            for row in ws {
                validate_weights(row, n_v)?;
            }
        }
        Ok(Self {
            u_degree,
            v_degree,
            u_periodic,
            v_periodic,
            u_knots,
            v_knots,
            u_mults,
            v_mults,
            poles,
            weights,
        })
    }

    pub fn u_degree(&self) -> usize {
        self.u_degree
    }

    pub fn v_degree(&self) -> usize {
        self.v_degree
    }

    pub fn is_u_periodic(&self) -> bool {
        self.u_periodic
    }

    pub fn is_v_periodic(&self) -> bool {
        self.v_periodic
    }

    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    pub fn poles(&self) -> &[Vec<Point3<f64>>] {
        &self.poles
    }

    /// Full weight grid, filling in 1.0 everywhere for a non-rational
    /// surface.
    pub fn effective_weights(&self) -> Vec<Vec<f64>> {
        match &self.weights {
            Some(ws) => ws.clone(),
            None => vec![vec![1.0; self.poles[0].len()]; self.poles.len()],
        }
    }

    pub fn u_knot_sequence(&self) -> Vec<f64> {
        unroll(&self.u_knots, &self.u_mults)
    }

    pub fn v_knot_sequence(&self) -> Vec<f64> {
        unroll(&self.v_knots, &self.v_mults)
    }

    /// Parameter domain as `([u_first, u_last], [v_first, v_last])`.
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let dir = |flat: &[f64], degree: usize, periodic: bool, knots: &[f64]| {
            if periodic {
                [knots[0], knots[knots.len() - 1]]
            } else {
                [flat[degree], flat[flat.len() - 1 - degree]]
            }
        };
        (
            dir(
                &self.u_knot_sequence(),
                self.u_degree,
                self.u_periodic,
                &self.u_knots,
            ),
            dir(
                &self.v_knot_sequence(),
                self.v_degree,
                self.v_periodic,
                &self.v_knots,
            ),
        )
    }

    /// Returns an equivalent surface that is periodic in neither direction.
    pub fn set_not_periodic(&self) -> BSplineSurface {
        let mut out = self.clone();
        if out.u_periodic {
            let (knots, mults, take) =
                unwrap_periodic(&out.u_knots, &out.u_mults, out.poles.len(), out.u_degree);
            out.poles = take.iter().map(|&i| out.poles[i].clone()).collect();
            out.weights = out
                .weights
                .map(|ws| take.iter().map(|&i| ws[i].clone()).collect());
            out.u_knots = knots;
            out.u_mults = mults;
            out.u_periodic = false;
        }
        if out.v_periodic {
            let n_v = out.poles[0].len();
            let (knots, mults, take) =
                unwrap_periodic(&out.v_knots, &out.v_mults, n_v, out.v_degree);
            for row in &mut out.poles {
                *row = take.iter().map(|&j| row[j]).collect();
            }
            out.weights = out.weights.map(|ws| {
                ws.into_iter()
                    .map(|row| take.iter().map(|&j| row[j]).collect())
                    .collect()
            });
            out.v_knots = knots;
            out.v_mults = mults;
            out.v_periodic = false;
        }
        out
    }

    /// Evaluates the surface. Parameters clamp to the domain.
    pub fn point_at(&self, u: f64, v: f64) -> Point3<f64> {
        if self.u_periodic || self.v_periodic {
            return self.set_not_periodic().point_at(u, v);
        }
        let (h, _, _) = self.eval_homogeneous(u, v, false);
        dehomogenize(h)
    }

    /// Value and first partial derivatives.
    pub fn d1(&self, u: f64, v: f64) -> (Point3<f64>, Vector3<f64>, Vector3<f64>) {
        if self.u_periodic || self.v_periodic {
            return self.set_not_periodic().d1(u, v);
        }
        let (h, hu, hv) = self.eval_homogeneous(u, v, true);
        let w = h[3];
        let p = dehomogenize(h);
        // rational quotient rule: S' = (A' - S * w') / w
        let project = |hd: [f64; 4]| {
            Vector3::new(
                (hd[0] - p.x * hd[3]) / w,
                (hd[1] - p.y * hd[3]) / w,
                (hd[2] - p.z * hd[3]) / w,
            )
        };
        (p, project(hu), project(hv))
    }

    /// Normalized du x dv, or `None` when degenerate.
    pub fn normal_at(&self, u: f64, v: f64) -> Option<Vector3<f64>> {
        let (_, du, dv) = self.d1(u, v);
        let n = du.cross(&dv);
        let len = n.norm();
        if len < 1e-12 { None } else { Some(n / len) }
    }

    pub fn transformed(&self, trsf: &crate::geom::Trsf) -> BSplineSurface {
        let mut out = self.clone();
        for row in &mut out.poles {
            for p in row.iter_mut() {
                *p = trsf.transform_point(p);
            }
        }
        out
    }

    /// Homogeneous value and (optionally) partials at (u, v). Callers must
    /// have de-periodized first.
    fn eval_homogeneous(&self, u: f64, v: f64, with_derivs: bool) -> ([f64; 4], [f64; 4], [f64; 4]) {
        let u_flat = self.u_knot_sequence();
        let v_flat = self.v_knot_sequence();
        let ([u0, u1], [v0, v1]) = self.bounds();
        let u = u.clamp(u0, u1);
        let v = v.clamp(v0, v1);

        let ones;
        let weights = match &self.weights {
            Some(ws) => ws,
            None => {
                ones = vec![vec![1.0; self.poles[0].len()]; self.poles.len()];
                &ones
            }
        };

        // reduce in V per U row, then evaluate the resulting U curve
        let rows: Vec<[f64; 4]> = self
            .poles
            .iter()
            .zip(weights)
            .map(|(prow, wrow)| {
                let hrow = homogeneous_row(prow, wrow);
                de_boor(&v_flat, &hrow, self.v_degree, v)
            })
            .collect();
        let value = de_boor(&u_flat, &rows, self.u_degree, u);

        if !with_derivs {
            return (value, [0.0; 4], [0.0; 4]);
        }

        let du = de_boor_derivative(&u_flat, &rows, self.u_degree, u);

        // reduce in U per V column for the V partial
        let n_v = self.poles[0].len();
        let cols: Vec<[f64; 4]> = (0..n_v)
            .map(|j| {
                let hcol: Vec<[f64; 4]> = self
                    .poles
                    .iter()
                    .zip(weights)
                    .map(|(prow, wrow)| homogeneous_one(&prow[j], wrow[j]))
                    .collect();
                de_boor(&u_flat, &hcol, self.u_degree, u)
            })
            .collect();
        let dv = de_boor_derivative(&v_flat, &cols, self.v_degree, v);

        (value, du, dv)
    }
}

/// A planar B-spline, used for curve-on-surface (p-curve) records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineCurve2d {
    degree: usize,
    periodic: bool,
    knots: Vec<f64>,
    mults: Vec<usize>,
    poles: Vec<Point2<f64>>,
    weights: Option<Vec<f64>>,
}

impl BSplineCurve2d {
    pub fn new(
        degree: usize,
        knots: Vec<f64>,
        mults: Vec<usize>,
        poles: Vec<Point2<f64>>,
        weights: Option<Vec<f64>>,
        periodic: bool,
    ) -> Result<Self> {
        validate_direction(degree, &knots, &mults, poles.len(), periodic)?;
        if let Some(ws) = &weights {
            validate_weights(ws, poles.len())?;
        }
        Ok(Self {
            degree,
            periodic,
            knots,
            mults,
            poles,
            weights,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn first_parameter(&self) -> f64 {
        if self.periodic {
            self.knots[0]
        } else {
            unroll(&self.knots, &self.mults)[self.degree]
        }
    }

    pub fn last_parameter(&self) -> f64 {
        if self.periodic {
            self.knots[self.knots.len() - 1]
        } else {
            let flat = unroll(&self.knots, &self.mults);
            flat[flat.len() - 1 - self.degree]
        }
    }

    /// Evaluates the p-curve. Parameters clamp to the domain.
    pub fn point_at(&self, t: f64) -> Point2<f64> {
        let hpole = |p: &Point2<f64>, w: f64| [p.x * w, p.y * w, w];
        let (flat, hpoles) = if self.periodic {
            let (knots, mults, take) =
                unwrap_periodic(&self.knots, &self.mults, self.poles.len(), self.degree);
            let hp = take
                .iter()
                .map(|&i| hpole(&self.poles[i], self.weights.as_ref().map_or(1.0, |ws| ws[i])))
                .collect::<Vec<_>>();
            (unroll(&knots, &mults), hp)
        } else {
            let hp = self
                .poles
                .iter()
                .enumerate()
                .map(|(i, p)| hpole(p, self.weights.as_ref().map_or(1.0, |ws| ws[i])))
                .collect::<Vec<_>>();
            (unroll(&self.knots, &self.mults), hp)
        };
        let t = t.clamp(flat[self.degree], flat[flat.len() - 1 - self.degree]);
        let h = de_boor(&flat, &hpoles, self.degree, t);
        Point2::new(h[0] / h[2], h[1] / h[2])
    }
}

fn validate_direction(
    degree: usize,
    knots: &[f64],
    mults: &[usize],
    n_poles: usize,
    periodic: bool,
) -> Result<()> {
    if degree == 0 {
        return Err(ShapeIoError::InvalidGeometry(
            "spline degree must be at least 1".to_string(),
        ));
    }
    if knots.len() < 2 || knots.len() != mults.len() {
        return Err(ShapeIoError::InvalidGeometry(format!(
            "knot/multiplicity mismatch: {} knots, {} multiplicities",
            knots.len(),
            mults.len()
        )));
    }
    if knots.windows(2).any(|w| w[1] <= w[0]) {
        return Err(ShapeIoError::InvalidGeometry(
            "knots must be strictly increasing".to_string(),
        ));
    }
    if mults.iter().any(|&m| m == 0 || m > degree + 1) {
        return Err(ShapeIoError::InvalidGeometry(format!(
            "multiplicities must be in 1..={}",
            degree + 1
        )));
    }
    let total: usize = mults.iter().sum();
    if periodic {
        if mults[0] != mults[mults.len() - 1] {
            return Err(ShapeIoError::InvalidGeometry(
                "periodic spline needs equal first and last multiplicities".to_string(),
            ));
        }
        if n_poles <= degree {
            return Err(ShapeIoError::InvalidGeometry(format!(
                "periodic spline of degree {degree} needs more than {degree} poles"
            )));
        }
        if total - mults[mults.len() - 1] != n_poles {
            return Err(ShapeIoError::InvalidGeometry(format!(
                "periodic knot law violated: sum(mults) - last = {} but {n_poles} poles",
                total - mults[mults.len() - 1]
            )));
        }
    } else {
        if n_poles <= degree {
            return Err(ShapeIoError::InvalidGeometry(format!(
                "spline of degree {degree} needs at least {} poles",
                degree + 1
            )));
        }
        if total != n_poles + degree + 1 {
            return Err(ShapeIoError::InvalidGeometry(format!(
                "knot law violated: sum(mults) = {total} but poles + degree + 1 = {}",
                n_poles + degree + 1
            )));
        }
    }
    Ok(())
}

fn validate_weights(weights: &[f64], n_poles: usize) -> Result<()> {
    if weights.len() != n_poles {
        return Err(ShapeIoError::InvalidGeometry(format!(
            "{} weights for {n_poles} poles",
            weights.len()
        )));
    }
    if weights.iter().any(|&w| w <= 0.0) {
        return Err(ShapeIoError::InvalidGeometry(
            "weights must be positive".to_string(),
        ));
    }
    Ok(())
}

fn unroll(knots: &[f64], mults: &[usize]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(mults.iter().sum());
    for (k, &m) in knots.iter().zip(mults) {
        for _ in 0..m {
            flat.push(*k);
        }
    }
    flat
}

/// Builds the de-periodized knot vector and pole index map for one
/// direction: `degree` wrapped knots before the seam, one full period,
/// `degree + 1` wrapped knots after; poles repeat cyclically.
fn unwrap_periodic(
    knots: &[f64],
    mults: &[usize],
    count: usize,
    degree: usize,
) -> (Vec<f64>, Vec<usize>, Vec<usize>) {
    let m = knots.len();
    let period = knots[m - 1] - knots[0];
    let mut period_flat = Vec::with_capacity(count);
    for i in 0..m - 1 {
        for _ in 0..mults[i] {
            period_flat.push(knots[i]);
        }
    }
    debug_assert_eq!(period_flat.len(), count);

    let mut flat = Vec::with_capacity(count + 2 * degree + 1);
    for i in 0..degree {
        flat.push(period_flat[count - degree + i] - period);
    }
    flat.extend_from_slice(&period_flat);
    for &k in period_flat.iter().take(degree + 1) {
        flat.push(k + period);
    }

    let (new_knots, new_mults) = group_flat(&flat);
    let take = (0..count + degree).map(|i| i % count).collect();
    (new_knots, new_mults, take)
}

fn group_flat(flat: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut knots: Vec<f64> = Vec::new();
    let mut mults: Vec<usize> = Vec::new();
    for &k in flat {
        match (knots.last(), mults.last_mut()) {
            (Some(&last), Some(m)) if last == k => *m += 1,
            _ => {
                knots.push(k);
                mults.push(1);
            }
        }
    }
    (knots, mults)
}

fn homogeneous(poles: &[Point3<f64>], weights: Option<&[f64]>) -> Vec<[f64; 4]> {
    poles
        .iter()
        .enumerate()
        .map(|(i, p)| homogeneous_one(p, weights.map_or(1.0, |ws| ws[i])))
        .collect()
}

fn homogeneous_row(poles: &[Point3<f64>], weights: &[f64]) -> Vec<[f64; 4]> {
    poles
        .iter()
        .zip(weights)
        .map(|(p, &w)| homogeneous_one(p, w))
        .collect()
}

fn homogeneous_one(p: &Point3<f64>, w: f64) -> [f64; 4] {
    [p.x * w, p.y * w, p.z * w, w]
}

fn dehomogenize(h: [f64; 4]) -> Point3<f64> {
    Point3::new(h[0] / h[3], h[1] / h[3], h[2] / h[3])
}

/// Largest span index `s` in `[degree, n_poles - 1]` with `flat[s] <= t`.
fn find_span(flat: &[f64], degree: usize, n_poles: usize, t: f64) -> usize {
    let mut s = degree;
    while s + 1 < n_poles && flat[s + 1] <= t {
        s += 1;
    }
    s
}

/// De Boor's algorithm over homogeneous coordinates of any dimension.
pub(crate) fn de_boor<const M: usize>(
    flat: &[f64],
    poles: &[[f64; M]],
    degree: usize,
    t: f64,
) -> [f64; M] {
    let s = find_span(flat, degree, poles.len(), t);
    let mut d: Vec<[f64; M]> = poles[s - degree..=s].to_vec();
    for r in 1..=degree {
        for j in (r..=degree).rev() {
            let i = s - degree + j;
            let denom = flat[i + degree + 1 - r] - flat[i];
            let alpha = if denom.abs() < f64::EPSILON {
                0.0
            } else {
                (t - flat[i]) / denom
            };
            for m in 0..M {
                d[j][m] = (1.0 - alpha) * d[j - 1][m] + alpha * d[j][m];
            }
        }
    }
    d[degree]
}

/// First derivative of a (homogeneous) B-spline curve: evaluates the
/// degree-1 difference curve.
fn de_boor_derivative<const M: usize>(
    flat: &[f64],
    poles: &[[f64; M]],
    degree: usize,
    t: f64,
) -> [f64; M] {
    if degree == 0 || poles.len() < 2 {
        return [0.0; M];
    }
    let n = poles.len();
    let mut dpoles = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let denom = flat[i + degree + 1] - flat[i + 1];
        let scale = if denom.abs() < f64::EPSILON {
            0.0
        } else {
            degree as f64 / denom
        };
        let mut q = [0.0; M];
        for m in 0..M {
            q[m] = scale * (poles[i + 1][m] - poles[i][m]);
        }
        dpoles.push(q);
    }
    let dflat = &flat[1..flat.len() - 1];
    de_boor(dflat, &dpoles, degree - 1, t)
}
