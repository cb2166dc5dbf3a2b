// SPDX: CC0-1.0

pub mod config;
pub mod export;
pub mod expr;
pub mod formula;
pub mod grid;
pub mod op;
pub mod sweep;

pub type Number = f64;

pub use config::SweepConfig;
pub use expr::evaluate;
pub use grid::{linear_grid, log_grid, AxisRange, GridErr, Spacing};
pub use op::{apply, Operator, OperatorTriple, UnknownOperator};
pub use sweep::{evaluate_grid, par_sweep, sweep, SweepItem, SweepItems, ValueGrid};
