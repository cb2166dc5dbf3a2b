// SPDX: CC0-1.0

use crate::{grid::AxisRange, Number};
use ndarray::{Array2, Array3};

/// Denominators below this magnitude are masked as `None`. Independent of
/// [`crate::op::DIVIDE_EPSILON`], which only governs the operator sweep.
pub const MASK_EPSILON: Number = 1e-9;

pub const CURVE_POLE: Number = 200.0;
pub const CURVE_LIMIT: Number = -100.0;

#[inline]
fn masked(num: Number, denom: Number) -> Option<Number> {
    if denom.abs() < MASK_EPSILON {
        None
    } else {
        Some(num / denom)
    }
}

/// `100x / (200 - x)`
pub fn curve(x: Number) -> Option<Number> {
    masked(100.0 * x, CURVE_POLE - x)
}

/// `x*y / (2y - x)`
pub fn surface(x: Number, y: Number) -> Option<Number> {
    masked(y * x, 2.0 * y - x)
}

/// `x*y / (y*z - x)`
pub fn volume(x: Number, y: Number, z: Number) -> Option<Number> {
    masked(x * y, y * z - x)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub xs: Vec<Number>,
    pub ys: Vec<Option<Number>>,
}

impl Curve {
    pub fn sample<F>(xs: Vec<Number>, f: F) -> Self
    where
        F: Fn(Number) -> Option<Number>,
    {
        let ys = xs.iter().map(|&x| f(x)).collect();
        Self { xs, ys }
    }

    pub fn highlight(&self, band: AxisRange) -> Vec<(Number, Number)> {
        self.xs
            .iter()
            .zip(&self.ys)
            .filter_map(|(&x, &y)| y.filter(|&y| band.contains(y)).map(|y| (x, y)))
            .collect()
    }
}

pub fn sample_surface<F>(xs: &[Number], ys: &[Number], f: F) -> Array2<Option<Number>>
where
    F: Fn(Number, Number) -> Option<Number>,
{
    Array2::from_shape_fn((xs.len(), ys.len()), |(ix, iy)| f(xs[ix], ys[iy]))
}

pub fn sample_volume<F>(
    xs: &[Number],
    ys: &[Number],
    zs: &[Number],
    f: F,
) -> Array3<Option<Number>>
where
    F: Fn(Number, Number, Number) -> Option<Number>,
{
    Array3::from_shape_fn((xs.len(), ys.len(), zs.len()), |(ix, iy, iz)| {
        f(xs[ix], ys[iy], zs[iz])
    })
}

/// Median of the finite values, or `None` if there are none.
pub fn median_finite<'a, I>(values: I) -> Option<Number>
where
    I: IntoIterator<Item = &'a Option<Number>>,
{
    let mut finite: Vec<Number> = values
        .into_iter()
        .filter_map(|v| v.filter(|v| v.is_finite()))
        .collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(Number::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    } else {
        Some(finite[mid])
    }
}

/// A defined cell belongs to the shell if a defined neighbour one step further
/// along any axis lies on the other side. Values at or below `iso` count as
/// inside.
pub fn iso_shell(values: &Array3<Option<Number>>, iso: Number) -> Vec<[usize; 3]> {
    let (nx, ny, nz) = values.dim();
    let inside = |v: Number| v <= iso;
    let mut shell = Vec::new();
    for ((ix, iy, iz), cell) in values.indexed_iter() {
        let Some(v) = *cell else {
            continue;
        };
        let neighbours = [
            (ix + 1 < nx).then(|| values[[ix + 1, iy, iz]]),
            (iy + 1 < ny).then(|| values[[ix, iy + 1, iz]]),
            (iz + 1 < nz).then(|| values[[ix, iy, iz + 1]]),
        ];
        let crosses = neighbours
            .into_iter()
            .flatten()
            .flatten()
            .any(|n| inside(n) != inside(v));
        if crosses {
            shell.push([ix, iy, iz]);
        }
    }
    shell
}
