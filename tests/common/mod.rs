#![allow(dead_code)]

use approx::assert_relative_eq;
use nalgebra::{DMatrix, Vector3};
use oimerge::model::{
    DataColumn, OIArray, OIData, OIDataKind, OIFitsFile, OIFitsStandard, OITarget, OIWavelength,
    Station, Target,
};
use smallvec::smallvec;

/// Position of a named test source; the same name always lands on the same sky position.
pub fn target(name: &str) -> Target {
    let seed = name.bytes().map(f64::from).sum::<f64>();
    Target::new(name, seed % 360.0, (seed % 90.0) - 45.0)
}

pub fn vlti() -> OIArray {
    OIArray::new(
        "VLTI",
        Vector3::new(1_942_014.0, -5_455_311.0, -2_654_394.0),
        vec![
            Station::new("UT1", "U1", 1, 8.2, Vector3::new(-9.9, -20.3, 0.0)),
            Station::new("UT2", "U2", 2, 8.2, Vector3::new(14.8, 30.3, 0.0)),
        ],
    )
}

pub fn wavelength(name: &str, eff_wave: &[f32]) -> OIWavelength {
    OIWavelength::new(name, eff_wave.to_vec(), vec![5e-8; eff_wave.len()])
}

/// VIS2 table with one row per `(target_id, mjd)` pair and a VIS2DATA column holding the row
/// index, so compaction can be checked row by row.
pub fn vis2(ins_name: &str, nwave: usize, rows: &[(i16, f64)]) -> OIData {
    let nrows = rows.len();
    let ids = rows.iter().map(|(id, _)| *id).collect();
    let mjds = rows.iter().map(|(_, mjd)| *mjd).collect();
    let vis2data = DMatrix::from_fn(nrows, nwave, |r, c| r as f64 + c as f64 / 10.0);

    OIData::new(OIDataKind::Vis2, ins_name, nwave, ids, mjds)
        .unwrap()
        .with_arr_name("VLTI")
        .with_sta_index(vec![smallvec![1, 2]; nrows])
        .unwrap()
        .with_column(DataColumn::per_channel("VIS2DATA", vis2data))
        .unwrap()
        .with_column(
            DataColumn::per_row("UCOORD", (0..nrows).map(|r| r as f64).collect()).with_unit("m"),
        )
        .unwrap()
}

/// File holding `names` under identifiers `1..=n`, one wavelength table, VLTI, and one VIS2
/// table with one row per target at `mjd`.
pub fn observation_file(
    version: OIFitsStandard,
    names: &[&str],
    ins_name: &str,
    eff_wave: &[f32],
    mjd: f64,
) -> OIFitsFile {
    let mut file = OIFitsFile::new(version);
    let mut dir = OITarget::new();
    for (i, name) in names.iter().enumerate() {
        dir.push(i as i16 + 1, target(name));
    }
    file.add_table(dir).unwrap();
    file.add_table(wavelength(ins_name, eff_wave)).unwrap();
    file.add_table(vlti()).unwrap();

    let rows: Vec<(i16, f64)> = (1..=names.len() as i16).map(|id| (id, mjd)).collect();
    file.add_table(vis2(ins_name, eff_wave.len(), &rows)).unwrap();
    file
}

/// Names of the output OI_TARGET table, in identifier order.
pub fn target_names(file: &OIFitsFile) -> Vec<(i16, String)> {
    file.oi_target()
        .map(|dir| {
            dir.entries()
                .iter()
                .map(|e| (e.target_id, e.target.target.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Data tables of a file, in file order.
pub fn data_tables(file: &OIFitsFile) -> Vec<&OIData> {
    file.oi_datas().map(|(_, data)| data).collect()
}

pub fn assert_mjd_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-9);
    }
}

/// Route `tracing` events to the test output (`RUST_LOG=oimerge=debug cargo test`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
