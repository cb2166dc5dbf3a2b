// SPDX: CC0-1.0

use crate::{
    expr::evaluate,
    op::{OperatorTriple, Triples},
    Number,
};
use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;

/// Indexed `[ix, iy]`; `None` marks a cell where the expression is undefined.
pub type ValueGrid = Array2<Option<Number>>;

#[derive(Clone, Debug, PartialEq)]
pub struct SweepItem {
    pub ops: OperatorTriple,
    pub z: Number,
    pub values: ValueGrid,
}

pub fn evaluate_grid(
    xs: &[Number],
    ys: &[Number],
    z: Number,
    ops: OperatorTriple,
    a: Number,
) -> ValueGrid {
    Array2::from_shape_fn((xs.len(), ys.len()), |(ix, iy)| {
        evaluate(xs[ix], ys[iy], z, ops, a)
    })
}

/// Lazy sequence of [`SweepItem`]s, one per `(triple, z)` pair.
///
/// Triples vary slowest; each grid is computed only when the item is pulled.
#[derive(Clone, Debug)]
pub struct SweepItems<'a> {
    xs: &'a [Number],
    ys: &'a [Number],
    zs: &'a [Number],
    a: Number,
    triples: Triples,
    cur: Option<OperatorTriple>,
    z_idx: usize,
}

impl<'a> SweepItems<'a> {
    pub fn new(xs: &'a [Number], ys: &'a [Number], zs: &'a [Number], a: Number) -> Self {
        let mut triples = OperatorTriple::all();
        let cur = triples.next();
        Self {
            xs,
            ys,
            zs,
            a,
            triples,
            cur,
            z_idx: 0,
        }
    }
}

impl Iterator for SweepItems<'_> {
    type Item = SweepItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.zs.is_empty() {
            return None;
        }
        let ops = self.cur?;
        let z = self.zs[self.z_idx];
        self.z_idx += 1;
        if self.z_idx == self.zs.len() {
            self.z_idx = 0;
            self.cur = self.triples.next();
        }
        Some(SweepItem {
            ops,
            z,
            values: evaluate_grid(self.xs, self.ys, z, ops, self.a),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = match self.cur {
            _ if self.zs.is_empty() => 0,
            None => 0,
            Some(_) => (self.triples.len() + 1) * self.zs.len() - self.z_idx,
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for SweepItems<'_> {}

/// Hands every `(triple, z)` grid to `sink` in order, returning how many were
/// produced. Stops at the first sink error.
pub fn sweep<S, E>(
    xs: &[Number],
    ys: &[Number],
    zs: &[Number],
    a: Number,
    mut sink: S,
) -> Result<usize, E>
where
    S: FnMut(SweepItem) -> Result<(), E>,
{
    info!(
        "sweeping {} operator triples over {} z value(s) on a {}x{} grid",
        OperatorTriple::COUNT,
        zs.len(),
        xs.len(),
        ys.len()
    );
    let mut count = 0;
    for item in SweepItems::new(xs, ys, zs, a) {
        debug!("evaluated ops={} z={}", item.ops, item.z);
        sink(item)?;
        count += 1;
    }
    Ok(count)
}

/// Items reach `sink` in no particular order.
pub fn par_sweep<S, E>(
    xs: &[Number],
    ys: &[Number],
    zs: &[Number],
    a: Number,
    sink: S,
) -> Result<usize, E>
where
    S: Fn(SweepItem) -> Result<(), E> + Sync + Send,
    E: Send,
{
    info!(
        "sweeping {} operator triples over {} z value(s) on a {}x{} grid (parallel)",
        OperatorTriple::COUNT,
        zs.len(),
        xs.len(),
        ys.len()
    );
    let pairs: Vec<(OperatorTriple, Number)> = OperatorTriple::all()
        .flat_map(|ops| zs.iter().map(move |&z| (ops, z)))
        .collect();
    let count = pairs.len();
    pairs.into_par_iter().try_for_each(|(ops, z)| {
        debug!("evaluated ops={ops} z={z}");
        sink(SweepItem {
            ops,
            z,
            values: evaluate_grid(xs, ys, z, ops, a),
        })
    })?;
    Ok(count)
}
