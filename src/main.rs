// SPDX: CC0-1.0

use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::{path::PathBuf, process::ExitCode, sync::Mutex};
use surface_sweep::{
    config::{SweepConfig, SweepOverrides},
    export::{self, OutputDir, SweepExporter},
    formula::{self, Curve, CURVE_POLE},
    grid::{linear_grid, AxisRange, Spacing},
    op::OperatorTriple,
    sweep::{self, SweepItem},
    Number,
};

#[derive(Parser, Debug)]
#[command(name = "surface-sweep")]
#[command(about = "Sample closed-form functions over grids and write gnuplot plots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output directory (defaults to a timestamped directory)
    #[arg(long)]
    out: Option<PathBuf>,
    /// Run gnuplot on every written script
    #[arg(long)]
    plot: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate (a op1 y) op2 ((y op3 z) op3 x) for every operator triple
    Sweep {
        /// JSON config file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,
        /// x range as min:max
        #[arg(long, allow_hyphen_values = true)]
        x: Option<AxisRange>,
        /// y range as min:max
        #[arg(long, allow_hyphen_values = true)]
        y: Option<AxisRange>,
        /// Fixed z values, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        z: Vec<Number>,
        /// Points per axis
        #[arg(long)]
        points: Option<usize>,
        /// Constant a
        #[arg(short, allow_hyphen_values = true)]
        a: Option<Number>,
        #[arg(long, value_enum)]
        spacing: Option<Spacing>,
        /// Only evaluate one triple, e.g. plus,minus,div
        #[arg(long)]
        ops: Option<OperatorTriple>,
        /// Evaluate on the current thread only
        #[arg(long)]
        sequential: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Plot F(x) = 100x / (200 - x) on both sides of its pole
    Curve {
        /// Points per branch
        #[arg(long, default_value_t = 1000)]
        points: usize,
        /// Spacing of the right branch
        #[arg(long, value_enum, default_value_t = Spacing::Log)]
        spacing: Spacing,
        /// Right end of the right branch (defaults to 1e9 for log, 300 for linear)
        #[arg(long)]
        right_max: Option<Number>,
        /// Highlight left-branch points whose value lies in min:max
        #[arg(long, allow_hyphen_values = true, default_value = "1:100")]
        band: AxisRange,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Plot F(x, y) = x*y / (2y - x)
    Surface {
        #[arg(long, allow_hyphen_values = true, default_value = "1:300")]
        x: AxisRange,
        #[arg(long, allow_hyphen_values = true, default_value = "1:300")]
        y: AxisRange,
        /// Points per axis
        #[arg(long, default_value_t = 300)]
        points: usize,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Isosurface of F(x, y, z) = x*y / (y*z - x) at the median value
    Volume {
        /// Range shared by all three axes
        #[arg(long, allow_hyphen_values = true, default_value = "1:300")]
        range: AxisRange,
        /// Points per axis
        #[arg(long, default_value_t = 50)]
        points: usize,
        #[command(flatten)]
        output: OutputArgs,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match try_main(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Sweep {
            config,
            x,
            y,
            z,
            points,
            a,
            spacing,
            ops,
            sequential,
            output,
        } => {
            let mut cfg = match config {
                Some(path) => SweepConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => SweepConfig::default(),
            };
            cfg.apply_overrides(SweepOverrides {
                x_range: x,
                y_range: y,
                z_values: z,
                point_count: points,
                constant_a: a,
                spacing,
                sequential,
            });
            run_sweep(&cfg, ops, &output)
        }

        Command::Curve {
            points,
            spacing,
            right_max,
            band,
            output,
        } => run_curve(points, spacing, right_max, band, &output),

        Command::Surface {
            x,
            y,
            points,
            output,
        } => run_surface(x, y, points, &output),

        Command::Volume {
            range,
            points,
            output,
        } => run_volume(range, points, &output),
    }
}

fn output_dir(args: &OutputArgs) -> anyhow::Result<OutputDir> {
    let path = args
        .out
        .clone()
        .unwrap_or_else(|| export::timestamped_dir(Local::now()));
    let dir = OutputDir::create(path)?;
    info!("writing output to {}", dir.path().display());
    Ok(dir)
}

fn plot_if_asked(dir: &OutputDir, args: &OutputArgs, script: &str) -> anyhow::Result<()> {
    if args.plot {
        dir.plot(script)?;
        info!("rendered {script}");
    } else {
        info!("wrote {script}");
    }
    Ok(())
}

fn run_sweep(
    cfg: &SweepConfig,
    only: Option<OperatorTriple>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    info!("{cfg}");
    let axes = cfg.axes().context("invalid sweep configuration")?;
    let dir = output_dir(output)?;
    let exporter = SweepExporter {
        dir: &dir,
        xs: &axes.xs,
        ys: &axes.ys,
        a: cfg.constant_a,
        with_z: cfg.z_values.len() > 1,
        plot: output.plot,
    };

    if let Some(ops) = only {
        for script in exporter.export_triple(ops, &cfg.z_values)? {
            info!("wrote {script}");
        }
        return Ok(());
    }

    let undefined = Mutex::new(0usize);
    let sink = |item: SweepItem| -> anyhow::Result<()> {
        let missing = item.values.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            *undefined.lock().unwrap_or_else(|e| e.into_inner()) += missing;
        }
        exporter.export(&item)?;
        Ok(())
    };
    let count = if cfg.parallel {
        sweep::par_sweep(&axes.xs, &axes.ys, &cfg.z_values, cfg.constant_a, sink)?
    } else {
        sweep::sweep(&axes.xs, &axes.ys, &cfg.z_values, cfg.constant_a, sink)?
    };
    let undefined = undefined.into_inner().unwrap_or_else(|e| e.into_inner());
    if undefined > 0 {
        warn!("{undefined} cell(s) were undefined and written as missing data");
    }
    info!("done, exported {count} plot(s)");
    Ok(())
}

fn run_curve(
    points: usize,
    spacing: Spacing,
    right_max: Option<Number>,
    band: AxisRange,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let right_max = right_max.unwrap_or(match spacing {
        Spacing::Linear => 300.0,
        Spacing::Log => 1e9,
    });
    let left = Curve::sample(
        linear_grid(1.0, CURVE_POLE - 1.0, points).context("invalid left branch")?,
        formula::curve,
    );
    let right = Curve::sample(
        AxisRange::new(CURVE_POLE + 1.0, right_max)
            .sample(spacing, points)
            .context("invalid right branch")?,
        formula::curve,
    );
    let highlighted = left.highlight(band);
    info!("{} left-branch point(s) lie in {band}", highlighted.len());

    let dir = output_dir(output)?;
    let script = export::export_curve(&dir, &left, &right, &highlighted, spacing)?;
    plot_if_asked(&dir, output, &script)
}

fn run_surface(
    x: AxisRange,
    y: AxisRange,
    points: usize,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let xs = x.sample(Spacing::Linear, points).context("invalid x range")?;
    let ys = y.sample(Spacing::Linear, points).context("invalid y range")?;
    let values = formula::sample_surface(&xs, &ys, formula::surface);

    let dir = output_dir(output)?;
    let script = export::export_surface(
        &dir,
        "surface",
        "Surface Plot of F(x, y) = y*x / (2*y - x)",
        "F(x, y)",
        &xs,
        &ys,
        &values,
    )?;
    plot_if_asked(&dir, output, &script)
}

fn run_volume(range: AxisRange, points: usize, output: &OutputArgs) -> anyhow::Result<()> {
    let axis = range
        .sample(Spacing::Linear, points)
        .context("invalid volume range")?;
    let values = formula::sample_volume(&axis, &axis, &axis, formula::volume);
    let iso = formula::median_finite(&values).context("volume has no finite values")?;
    let shell = formula::iso_shell(&values, iso);
    info!(
        "iso value {iso:.2}: {} of {} cell(s) on the shell",
        shell.len(),
        values.len()
    );

    let dir = output_dir(output)?;
    let script = export::export_isosurface(&dir, [&axis, &axis, &axis], &values, &shell, iso)?;
    plot_if_asked(&dir, output, &script)
}
