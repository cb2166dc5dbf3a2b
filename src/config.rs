// SPDX: CC0-1.0

use crate::{
    expr::DEFAULT_A,
    grid::{AxisRange, GridErr, Spacing},
    Number,
};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigErr {
    #[error("failed to read config file")]
    Io(#[from] io::Error),

    #[error("malformed config file")]
    Json(#[from] serde_json::Error),

    #[error("at least one z value is required")]
    NoZValues,

    #[error("constant a must be finite, but is {0}")]
    NonFiniteA(Number),

    #[error("z values must be finite, but found {0}")]
    NonFiniteZ(Number),

    #[error("z value {0} is listed more than once")]
    DuplicateZ(Number),

    #[error("invalid {axis} range")]
    Range {
        axis: &'static str,
        #[source]
        source: GridErr,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SweepConfig {
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    pub z_values: Vec<Number>,
    pub point_count: usize,
    pub constant_a: Number,
    pub spacing: Spacing,
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            x_range: AxisRange::new(1.0, 20.0),
            y_range: AxisRange::new(1.0, 20.0),
            z_values: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            point_count: 20,
            constant_a: DEFAULT_A,
            spacing: Spacing::Linear,
            parallel: true,
        }
    }
}

impl fmt::Display for SweepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepConfig")
            .field("x range", &format_args!("{}", self.x_range))
            .field("y range", &format_args!("{}", self.y_range))
            .field("z values", &self.z_values)
            .field("points", &self.point_count)
            .field("a", &self.constant_a)
            .field("spacing", &format_args!("{}", self.spacing))
            .field("parallel", &self.parallel)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SweepAxes {
    pub xs: Vec<Number>,
    pub ys: Vec<Number>,
}

/// Values given on the command line, each replacing its config file
/// counterpart when present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepOverrides {
    pub x_range: Option<AxisRange>,
    pub y_range: Option<AxisRange>,
    pub z_values: Vec<Number>,
    pub point_count: Option<usize>,
    pub constant_a: Option<Number>,
    pub spacing: Option<Spacing>,
    pub sequential: bool,
}

impl SweepConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigErr> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigErr> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn apply_overrides(&mut self, overrides: SweepOverrides) {
        let SweepOverrides {
            x_range,
            y_range,
            z_values,
            point_count,
            constant_a,
            spacing,
            sequential,
        } = overrides;
        if let Some(x) = x_range {
            self.x_range = x;
        }
        if let Some(y) = y_range {
            self.y_range = y;
        }
        if !z_values.is_empty() {
            self.z_values = z_values;
        }
        if let Some(points) = point_count {
            self.point_count = points;
        }
        if let Some(a) = constant_a {
            self.constant_a = a;
        }
        if let Some(spacing) = spacing {
            self.spacing = spacing;
        }
        if sequential {
            self.parallel = false;
        }
    }

    pub fn axes(&self) -> Result<SweepAxes, ConfigErr> {
        if self.z_values.is_empty() {
            return Err(ConfigErr::NoZValues);
        }
        if let Some(&z) = self.z_values.iter().find(|z| !z.is_finite()) {
            return Err(ConfigErr::NonFiniteZ(z));
        }
        // each z names its own output files
        for (i, z) in self.z_values.iter().enumerate() {
            if self.z_values[..i].contains(z) {
                return Err(ConfigErr::DuplicateZ(*z));
            }
        }
        if !self.constant_a.is_finite() {
            return Err(ConfigErr::NonFiniteA(self.constant_a));
        }
        let xs = self
            .x_range
            .sample(self.spacing, self.point_count)
            .map_err(|source| ConfigErr::Range { axis: "x", source })?;
        let ys = self
            .y_range
            .sample(self.spacing, self.point_count)
            .map_err(|source| ConfigErr::Range { axis: "y", source })?;
        Ok(SweepAxes { xs, ys })
    }

    pub fn validate(&self) -> Result<(), ConfigErr> {
        self.axes().map(|_| ())
    }
}
