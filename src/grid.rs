// SPDX: CC0-1.0

use crate::Number;
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridErr {
    #[error("a grid needs at least 2 points, but {count} were requested")]
    TooFewPoints { count: usize },

    #[error("logarithmic spacing needs positive bounds, but the range is [{lo}, {hi}]")]
    NonPositiveBound { lo: Number, hi: Number },

    #[error("grid bounds must be finite, but the range is [{lo}, {hi}]")]
    NonFinite { lo: Number, hi: Number },

    #[error("invalid range '{text}': expected 'min:max'")]
    ParseRange { text: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    #[default]
    Linear,
    Log,
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Log => write!(f, "log"),
        }
    }
}

fn expect_finite(lo: Number, hi: Number) -> Result<(), GridErr> {
    if lo.is_finite() && hi.is_finite() {
        Ok(())
    } else {
        Err(GridErr::NonFinite { lo, hi })
    }
}

fn expect_points(count: usize) -> Result<(), GridErr> {
    if count < 2 {
        Err(GridErr::TooFewPoints { count })
    } else {
        Ok(())
    }
}

/// `count` evenly spaced values from `lo` to `hi`, both included.
pub fn linear_grid(lo: Number, hi: Number, count: usize) -> Result<Vec<Number>, GridErr> {
    expect_points(count)?;
    expect_finite(lo, hi)?;
    let step = (hi - lo) / (count - 1) as Number;
    let mut grid: Vec<Number> = (0..count).map(|i| lo + step * i as Number).collect();
    // pin the last point so accumulated rounding never moves it
    grid[count - 1] = hi;
    Ok(grid)
}

/// `count` values from `lo` to `hi`, both included, evenly spaced in `log10`.
pub fn log_grid(lo: Number, hi: Number, count: usize) -> Result<Vec<Number>, GridErr> {
    expect_points(count)?;
    expect_finite(lo, hi)?;
    if lo <= 0.0 || hi <= 0.0 {
        return Err(GridErr::NonPositiveBound { lo, hi });
    }
    let mut grid: Vec<Number> = linear_grid(lo.log10(), hi.log10(), count)?
        .into_iter()
        .map(|e| Number::powf(10.0, e))
        .collect();
    grid[0] = lo;
    grid[count - 1] = hi;
    Ok(grid)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AxisRange {
    pub lo: Number,
    pub hi: Number,
}

impl AxisRange {
    pub const fn new(lo: Number, hi: Number) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, v: Number) -> bool {
        self.lo <= v && v <= self.hi
    }

    pub fn sample(&self, spacing: Spacing, count: usize) -> Result<Vec<Number>, GridErr> {
        match spacing {
            Spacing::Linear => linear_grid(self.lo, self.hi, count),
            Spacing::Log => log_grid(self.lo, self.hi, count),
        }
    }
}

impl fmt::Display for AxisRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.lo, self.hi)
    }
}

impl FromStr for AxisRange {
    type Err = GridErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || GridErr::ParseRange {
            text: s.to_string(),
        };
        let (lo, hi) = s.split_once(':').ok_or_else(err)?;
        let lo: Number = lo.trim().parse().map_err(|_| err())?;
        let hi: Number = hi.trim().parse().map_err(|_| err())?;
        Ok(Self { lo, hi })
    }
}

impl TryFrom<String> for AxisRange {
    type Error = GridErr;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AxisRange> for String {
    fn from(r: AxisRange) -> Self {
        r.to_string()
    }
}
