use pretty_assertions::assert_eq;
use std::{collections::BTreeSet, fs, sync::Mutex};
use surface_sweep::{
    config::SweepConfig,
    evaluate,
    export::{OutputDir, SweepExporter},
    linear_grid, log_grid, par_sweep, sweep, Operator, OperatorTriple,
};
use test_log::test;

use Operator::*;

#[test]
fn documented_scenarios() {
    assert_eq!(
        evaluate(3.0, 4.0, 5.0, OperatorTriple(Add, Multiply, Subtract), 2.0),
        Some(-24.0)
    );

    let ops = OperatorTriple(Add, Add, Divide);
    let v = evaluate(10.0, 5.0, 5.0, ops, 2.0).unwrap();
    assert!((v - 7.1).abs() < 1e-12);
    assert_eq!(evaluate(5.0, 0.0, 5.0, ops, 2.0), Some(2.0));
    assert_eq!(evaluate(1.0, 1.0, 1.0, ops, 2.0), Some(4.0));
}

#[test]
fn grids_from_the_curve_script() {
    let left = linear_grid(1.0, 199.0, 1000).unwrap();
    let right = log_grid(201.0, 1e9, 1000).unwrap();
    assert_eq!((left.len(), left[0], left[999]), (1000, 1.0, 199.0));
    assert_eq!((right.len(), right[0], right[999]), (1000, 201.0, 1e9));
}

#[test]
fn sweep_exports_one_plot_per_triple() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = OutputDir::create(tmp.path().join("plots")).unwrap();
    let xs = linear_grid(1.0, 10.0, 10).unwrap();
    let ys = xs.clone();
    let exporter = SweepExporter {
        dir: &dir,
        xs: &xs,
        ys: &ys,
        a: 2.0,
        with_z: false,
        plot: false,
    };

    let count = sweep(&xs, &ys, &[5.0], 2.0, |item| {
        exporter.export(&item).map(|_| ())
    })
    .unwrap();
    assert_eq!(count, 64);

    let names: BTreeSet<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names.len(), 128);
    assert!(names.contains("f_xyz_plus_minus_div.data"));
    assert!(names.contains("f_xyz_div_minus_plus.gnuplot"));

    // (2 + y) + ((y - 5) - x) is defined everywhere
    let data = fs::read_to_string(dir.path().join("f_xyz_plus_plus_minus.data")).unwrap();
    assert!(!data.contains('?'));
    assert_eq!(data.lines().next(), Some("1 1 -2"));

    let data = fs::read_to_string(dir.path().join("f_xyz_plus_div_minus.data")).unwrap();
    // (2 + y) / ((y - 5) - x) is undefined where y - 5 == x
    assert!(data.lines().any(|l| l == "1 6 ?"));

    let script = fs::read_to_string(dir.path().join("f_xyz_plus_div_minus.gnuplot")).unwrap();
    assert!(script.contains(r#"set datafile missing "?""#));
    assert!(script.contains("set output 'f_xyz_plus_div_minus.png'"));
    assert!(script.contains("splot 'f_xyz_plus_div_minus.data'"));
}

#[test]
fn parallel_sweep_over_z_values_names_files_by_z() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = OutputDir::create(tmp.path()).unwrap();
    let cfg = SweepConfig {
        z_values: vec![1.0, 2.0],
        point_count: 4,
        ..Default::default()
    };
    let axes = cfg.axes().unwrap();
    let exporter = SweepExporter {
        dir: &dir,
        xs: &axes.xs,
        ys: &axes.ys,
        a: cfg.constant_a,
        with_z: true,
        plot: false,
    };
    let written = Mutex::new(BTreeSet::new());
    let count = par_sweep(&axes.xs, &axes.ys, &cfg.z_values, cfg.constant_a, |item| {
        let script = exporter.export(&item)?;
        written.lock().unwrap().insert(script);
        Ok::<_, anyhow::Error>(())
    })
    .unwrap();
    assert_eq!(count, 128);

    let written = written.into_inner().unwrap();
    assert_eq!(written.len(), 128);
    assert!(written.contains("f_xyz_mul_mul_mul_z1.gnuplot"));
    assert!(written.contains("f_xyz_mul_mul_mul_z2.gnuplot"));
}
