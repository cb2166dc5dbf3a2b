// SPDX: CC0-1.0

use crate::{
    formula::{Curve, CURVE_LIMIT, CURVE_POLE},
    grid::Spacing,
    op::OperatorTriple,
    sweep::{self, SweepItem},
    Number,
};
use anyhow::Context;
use chrono::{DateTime, Local};
use core::fmt;
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process,
};

// declared in every script with `set datafile missing` so undefined cells are skipped
const MISSING: &str = "?";
const SURFACE_RES: [u32; 2] = [800, 600];
const CURVE_RES: [u32; 2] = [1000, 600];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell(pub Option<Number>);

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str(MISSING),
        }
    }
}

/// `f_xyz_<op1>_<op2>_<op3>`, with a `_z<value>` suffix when several z values
/// are swept.
pub fn sweep_stem(ops: OperatorTriple, z: Number, with_z: bool) -> String {
    if with_z {
        format!("f_xyz_{}_z{z}", ops.tokens())
    } else {
        format!("f_xyz_{}", ops.tokens())
    }
}

pub fn timestamped_dir(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!(
        "{}_output-{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S")
    ))
}

#[derive(Clone, Debug)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    pub fn create(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create output directory {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self, name: &str) -> anyhow::Result<BufWriter<File>> {
        let path = self.path.join(name);
        let file = File::create(&path)
            .with_context(|| format!("failed to open output file {}", path.display()))?;
        Ok(BufWriter::new(file))
    }

    fn finish(&self, mut out: BufWriter<File>) -> anyhow::Result<()> {
        out.flush()?;
        out.get_mut().sync_data()?;
        Ok(())
    }

    pub fn plot(&self, script: &str) -> anyhow::Result<()> {
        let mut cmd = process::Command::new("gnuplot");
        cmd.current_dir(&self.path).arg(script);
        #[cfg(not(debug_assertions))]
        {
            cmd.stdout(Stdio::null())
                .stderr(Stdio::null())
                .stdin(Stdio::null());
        }
        let status = cmd
            .status()
            .context("failed to spawn gnuplot (is it installed and in ${PATH}?)")?;
        anyhow::ensure!(status.success(), "gnuplot failed on {script}: {status}");
        Ok(())
    }
}

fn write_header<W: Write>(mut out: W, res: [u32; 2], png: &str, title: &str) -> anyhow::Result<()> {
    let [width, height] = res;
    writeln!(out, "reset")?;
    writeln!(out, "set terminal pngcairo size {width},{height}")?;
    writeln!(out, "set output '{png}'")?;
    writeln!(out, r#"set datafile missing "{MISSING}""#)?;
    writeln!(out, r#"set title "{title}" noenhanced"#)?;
    Ok(())
}

/// Writes `x y value` rows grouped in blocks of constant x, the layout `splot`
/// expects for grid data.
pub fn write_surface_data<W: Write>(
    mut out: W,
    xs: &[Number],
    ys: &[Number],
    values: &ndarray::Array2<Option<Number>>,
) -> anyhow::Result<()> {
    debug_assert_eq!(values.dim(), (xs.len(), ys.len()));
    for (ix, row) in values.outer_iter().enumerate() {
        for (iy, v) in row.iter().enumerate() {
            writeln!(out, "{} {} {}", xs[ix], ys[iy], Cell(*v))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_surface_script<W: Write>(
    mut out: W,
    stem: &str,
    title: &str,
    zlabel: &str,
) -> anyhow::Result<()> {
    write_header(&mut out, SURFACE_RES, &format!("{stem}.png"), title)?;
    writeln!(out, r#"set xlabel "x""#)?;
    writeln!(out, r#"set ylabel "y""#)?;
    writeln!(out, r#"set zlabel "{zlabel}" noenhanced"#)?;
    writeln!(out, "set palette viridis")?;
    writeln!(out, "set pm3d depthorder")?;
    writeln!(out, "unset key")?;
    writeln!(out, "splot '{stem}.data' using 1:2:3 with pm3d")?;
    Ok(())
}

pub fn export_surface(
    dir: &OutputDir,
    stem: &str,
    title: &str,
    zlabel: &str,
    xs: &[Number],
    ys: &[Number],
    values: &ndarray::Array2<Option<Number>>,
) -> anyhow::Result<String> {
    let mut data = dir.open(&format!("{stem}.data"))?;
    write_surface_data(&mut data, xs, ys, values).context("failed to write surface data")?;
    dir.finish(data)?;

    let script_name = format!("{stem}.gnuplot");
    let mut script = dir.open(&script_name)?;
    write_surface_script(&mut script, stem, title, zlabel)
        .context("failed to write gnuplot script")?;
    dir.finish(script)?;
    Ok(script_name)
}

#[derive(Clone, Debug)]
pub struct SweepExporter<'a> {
    pub dir: &'a OutputDir,
    pub xs: &'a [Number],
    pub ys: &'a [Number],
    pub a: Number,
    pub with_z: bool,
    /// Run gnuplot on every script after writing it.
    pub plot: bool,
}

impl SweepExporter<'_> {
    pub fn export(&self, item: &SweepItem) -> anyhow::Result<String> {
        let stem = sweep_stem(item.ops, item.z, self.with_z);
        let title = format!(
            "f(x,y,z={z}) with ops={ops}, a={a}",
            z = item.z,
            ops = item.ops,
            a = self.a
        );
        let zlabel = format!("f(x,y,{})", item.z);
        let script = export_surface(
            self.dir,
            &stem,
            &title,
            &zlabel,
            self.xs,
            self.ys,
            &item.values,
        )
        .with_context(|| format!("failed to export ops={} z={}", item.ops, item.z))?;
        if self.plot {
            self.dir.plot(&script)?;
        }
        Ok(script)
    }

    /// Evaluates and exports a single triple for each of `zs`.
    pub fn export_triple(&self, ops: OperatorTriple, zs: &[Number]) -> anyhow::Result<Vec<String>> {
        zs.iter()
            .map(|&z| {
                let values = sweep::evaluate_grid(self.xs, self.ys, z, ops, self.a);
                self.export(&SweepItem { ops, z, values })
            })
            .collect()
    }
}

pub fn export_curve(
    dir: &OutputDir,
    left: &Curve,
    right: &Curve,
    band: &[(Number, Number)],
    spacing: Spacing,
) -> anyhow::Result<String> {
    let stem = "curve";
    for (name, branch) in [("left", left), ("right", right)] {
        let mut data = dir.open(&format!("{stem}_{name}.data"))?;
        for (x, y) in branch.xs.iter().zip(&branch.ys) {
            writeln!(data, "{x} {}", Cell(*y))?;
        }
        dir.finish(data)?;
    }
    let mut data = dir.open(&format!("{stem}_band.data"))?;
    for (x, y) in band {
        writeln!(data, "{x} {y}")?;
    }
    dir.finish(data)?;

    let script_name = format!("{stem}.gnuplot");
    let mut out = dir.open(&script_name)?;
    write_header(
        &mut out,
        CURVE_RES,
        &format!("{stem}.png"),
        "F(x) = 100x / (200 - x)",
    )?;
    match spacing {
        Spacing::Linear => writeln!(out, r#"set xlabel "x""#)?,
        Spacing::Log => {
            writeln!(out, "set logscale x")?;
            writeln!(out, r#"set xlabel "x (log scale)""#)?;
        }
    }
    writeln!(out, r#"set ylabel "F(x)""#)?;
    writeln!(out, "set grid")?;
    writeln!(out, "set key out vertical top right")?;
    writeln!(
        out,
        "set arrow from {CURVE_POLE}, graph 0 to {CURVE_POLE}, graph 1 nohead dt 2 lc 'red'"
    )?;
    write!(out, "plot '{stem}_left.data' using 1:2 with lines lc 'blue'")?;
    writeln!(out, r#" title "F(x) for x < {CURVE_POLE}", \"#)?;
    write!(out, "  '{stem}_right.data' using 1:2 with lines lc 'orange'")?;
    writeln!(out, r#" title "F(x) for x > {CURVE_POLE}", \"#)?;
    if !band.is_empty() {
        write!(out, "  '{stem}_band.data' using 1:2 with points pt 7 lc 'red'")?;
        writeln!(out, r#" title "highlighted band", \"#)?;
    }
    write!(out, "  {CURVE_LIMIT} with lines dt 2 lc 'dark-green'")?;
    writeln!(out, r#" title "y = {CURVE_LIMIT}""#)?;
    dir.finish(out)?;
    Ok(script_name)
}

/// Writes the iso shell as an `x y z value` point cloud.
pub fn export_isosurface(
    dir: &OutputDir,
    axes: [&[Number]; 3],
    values: &ndarray::Array3<Option<Number>>,
    shell: &[[usize; 3]],
    iso: Number,
) -> anyhow::Result<String> {
    let stem = "isosurface";
    let [xs, ys, zs] = axes;
    let mut data = dir.open(&format!("{stem}.data"))?;
    for &[ix, iy, iz] in shell {
        writeln!(
            data,
            "{} {} {} {}",
            xs[ix],
            ys[iy],
            zs[iz],
            Cell(values[[ix, iy, iz]])
        )?;
    }
    dir.finish(data)?;

    let script_name = format!("{stem}.gnuplot");
    let mut out = dir.open(&script_name)?;
    write_header(
        &mut out,
        SURFACE_RES,
        &format!("{stem}.png"),
        &format!("Isosurface of F(x,y,z) = (x*y)/(y*z - x) at iso value {iso:.2}"),
    )?;
    writeln!(out, r#"set xlabel "x""#)?;
    writeln!(out, r#"set ylabel "y""#)?;
    writeln!(out, r#"set zlabel "z""#)?;
    writeln!(out, "set palette viridis")?;
    writeln!(out, "unset key")?;
    writeln!(out, "splot '{stem}.data' using 1:2:3:4 with points pt 7 ps 0.5 palette")?;
    dir.finish(out)?;
    Ok(script_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Operator::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    #[test]
    fn stems() {
        let ops = OperatorTriple(Add, Subtract, Divide);
        assert_eq!(sweep_stem(ops, 5.0, false), "f_xyz_plus_minus_div");
        assert_eq!(sweep_stem(ops, 5.0, true), "f_xyz_plus_minus_div_z5");
        assert_eq!(
            sweep_stem(OperatorTriple(Multiply, Multiply, Add), 2.5, true),
            "f_xyz_mul_mul_plus_z2.5"
        );
    }

    #[test]
    fn undefined_cells_are_missing() {
        let values = array![[Some(1.5), None], [Some(-2.0), Some(0.25)]];
        let mut buf = Vec::new();
        write_surface_data(&mut buf, &[1.0, 2.0], &[10.0, 20.0], &values).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "1 10 1.5\n1 20 ?\n\n2 10 -2\n2 20 0.25\n\n"
        );
    }

    fn read(dir: &OutputDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    fn sample_curves() -> (Curve, Curve) {
        let left = Curve {
            xs: vec![100.0, 200.0],
            ys: vec![Some(100.0), None],
        };
        let right = Curve {
            xs: vec![300.0],
            ys: vec![Some(-300.0)],
        };
        (left, right)
    }

    #[test]
    fn curve_with_band_on_log_axis() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = OutputDir::create(tmp.path()).unwrap();
        let (left, right) = sample_curves();
        let script = export_curve(&dir, &left, &right, &[(100.0, 100.0)], Spacing::Log).unwrap();
        assert_eq!(script, "curve.gnuplot");

        assert_eq!(read(&dir, "curve_left.data"), "100 100\n200 ?\n");
        assert_eq!(read(&dir, "curve_right.data"), "300 -300\n");
        assert_eq!(read(&dir, "curve_band.data"), "100 100\n");

        let script = read(&dir, "curve.gnuplot");
        assert!(script.contains(r#"set datafile missing "?""#));
        assert!(script.contains("set output 'curve.png'"));
        assert!(script.contains("set logscale x\n"));
        assert!(script.contains("set arrow from 200, graph 0 to 200, graph 1"));
        assert!(script.contains(
            "plot 'curve_left.data' using 1:2 with lines lc 'blue' title \"F(x) for x < 200\", \\\n"
        ));
        assert!(script.contains("  'curve_right.data' using 1:2"));
        assert!(script.contains("  'curve_band.data' using 1:2 with points"));
        assert!(script.ends_with(
            "  -100 with lines dt 2 lc 'dark-green' title \"y = -100\"\n"
        ));
    }

    #[test]
    fn curve_without_band_on_linear_axis() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = OutputDir::create(tmp.path()).unwrap();
        let (left, right) = sample_curves();
        export_curve(&dir, &left, &right, &[], Spacing::Linear).unwrap();

        assert_eq!(read(&dir, "curve_band.data"), "");
        let script = read(&dir, "curve.gnuplot");
        assert!(!script.contains("logscale"));
        assert!(script.contains("set xlabel \"x\"\n"));
        assert!(!script.contains("curve_band.data"));
        assert!(script.contains("lc 'orange' title \"F(x) for x > 200\", \\\n  -100 with lines"));
    }

    #[test]
    fn isosurface_point_cloud() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = OutputDir::create(tmp.path()).unwrap();
        let values = ndarray::Array3::from_shape_vec(
            (2, 2, 1),
            vec![Some(0.0), Some(1.5), Some(5.0), None],
        )
        .unwrap();
        let xs = [1.0, 2.0];
        let ys = [10.0, 20.0];
        let zs = [100.0];
        let shell = [[0, 0, 0], [0, 1, 0], [1, 0, 0]];
        let script = export_isosurface(&dir, [&xs, &ys, &zs], &values, &shell, 2.5).unwrap();
        assert_eq!(script, "isosurface.gnuplot");

        assert_eq!(
            read(&dir, "isosurface.data"),
            "1 10 100 0\n1 20 100 1.5\n2 10 100 5\n"
        );
        let script = read(&dir, "isosurface.gnuplot");
        assert!(script.contains("at iso value 2.50"));
        assert!(script.contains("splot 'isosurface.data' using 1:2:3:4 with points"));
    }

    #[test]
    fn single_triple_over_each_z() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = OutputDir::create(tmp.path()).unwrap();
        let axis = [1.0, 2.0];
        let exporter = SweepExporter {
            dir: &dir,
            xs: &axis,
            ys: &axis,
            a: 2.0,
            with_z: true,
            plot: false,
        };
        let scripts = exporter
            .export_triple(OperatorTriple(Add, Divide, Subtract), &[1.0, 2.0])
            .unwrap();
        assert_eq!(
            scripts,
            vec![
                "f_xyz_plus_div_minus_z1.gnuplot",
                "f_xyz_plus_div_minus_z2.gnuplot"
            ]
        );
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 4);

        // (2 + y) / ((y - 1) - x), undefined where y - 1 == x
        assert_eq!(
            read(&dir, "f_xyz_plus_div_minus_z1.data"),
            "1 1 -3\n1 2 ?\n\n2 1 -1.5\n2 2 -4\n\n"
        );
        assert!(read(&dir, "f_xyz_plus_div_minus_z2.gnuplot")
            .contains("set output 'f_xyz_plus_div_minus_z2.png'"));
    }

    #[test]
    fn timestamped_dir_name() {
        use chrono::TimeZone;
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            timestamped_dir(now),
            PathBuf::from("surface_sweep_output-2024-03-09_14-05-07")
        );
    }
}
