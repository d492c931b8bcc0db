mod common;

use approx::assert_relative_eq;
use nalgebra::Vector3;
use common::{
    assert_mjd_close, data_tables, init_tracing, observation_file, target, target_names, vis2,
    vlti, wavelength,
};
use oimerge::{
    collection::{FileId, OIFitsCollection, SelectorResult, TableRef},
    constants::{OI_CORR, OI_WAVELENGTH, UNDEFINED_SHORT},
    merge, merge_collection, merge_files, merge_with_report,
    model::{
        ColumnValues, NightId, OICorr, OIData, OIDataKind, OIFitsFile, OIFitsStandard,
        OIPrimaryHDU, OITarget, TableId, Target,
    },
    Diagnostic, MergeError, MergeParams,
};

const N1: f64 = 58_000.1;
const N2: f64 = 58_010.1;

fn v1() -> OIFitsStandard {
    OIFitsStandard::Version1
}

#[test]
fn identical_wavelength_tables_collapse() {
    init_tracing();
    let f1 = observation_file(v1(), &["A"], "LOW", &[2.0e-6, 2.2e-6], N1);
    let f2 = observation_file(v1(), &["B"], "LOW", &[2.0e-6, 2.2e-6], N2);

    let collection = OIFitsCollection::new(vec![f1, f2]);
    let (merged, report) =
        merge_with_report(&collection.select_all(), &MergeParams::default()).unwrap();

    assert_eq!(merged.accepted_ins_names(), vec!["LOW"]);
    assert_eq!(merged.accepted_arr_names(), vec!["VLTI"]);
    let datas = data_tables(&merged);
    assert_eq!(datas.len(), 2);
    assert!(datas.iter().all(|d| d.ins_name() == "LOW"));

    assert!(report.is_clean());
    assert!(report.diagnostics().contains(&Diagnostic::IdenticalTable {
        ext_name: OI_WAVELENGTH,
        table: TableRef::new(FileId::from_index(1), TableId::from_index(1)),
        output_name: "LOW".into(),
    }));
}

#[test]
fn two_files_with_colliding_names() {
    init_tracing();
    let f1 = observation_file(v1(), &["A", "B"], "LOW", &[2.0e-6], N1);
    let f2 = observation_file(v1(), &["B", "C"], "LOW", &[2.0e-6, 2.2e-6], N2);

    let merged = merge_files(vec![f1, f2], &MergeParams::default()).unwrap();

    assert_eq!(
        target_names(&merged),
        vec![(1, "A".into()), (2, "B".into()), (3, "C".into())]
    );
    assert_eq!(merged.accepted_ins_names(), vec!["LOW", "LOW_1"]);
    assert_eq!(merged.oi_wavelength("LOW").map(|(_, w)| w.nwave()), Some(1));
    assert_eq!(merged.oi_wavelength("LOW_1").map(|(_, w)| w.nwave()), Some(2));

    let datas = data_tables(&merged);
    assert_eq!(datas.len(), 2);
    assert_eq!(datas[0].ins_name(), "LOW");
    assert_eq!(datas[0].target_id(), &[1, 2]);
    assert_eq!(datas[1].ins_name(), "LOW_1");
    assert_eq!(datas[1].target_id(), &[2, 3]);
    assert_eq!(datas[1].nwave(), 2);
}

#[test]
fn colliding_array_names_are_renamed() {
    init_tracing();
    let f1 = observation_file(v1(), &["A"], "LOW", &[2.0e-6], N1);

    let mut moved = vlti();
    moved.stations[1].sta_xyz = Vector3::new(54.8, 90.3, 0.0);
    let mut dir = OITarget::new();
    dir.push(1, target("B"));
    let mut f2 = OIFitsFile::new(v1());
    f2.add_table(dir).unwrap();
    f2.add_table(wavelength("LOW", &[2.0e-6])).unwrap();
    f2.add_table(moved.clone()).unwrap();
    f2.add_table(vis2("LOW", 1, &[(1, N2)])).unwrap();

    let merged = merge_files(vec![f1, f2], &MergeParams::default()).unwrap();

    assert_eq!(merged.accepted_ins_names(), vec!["LOW"]);
    assert_eq!(merged.accepted_arr_names(), vec!["VLTI", "VLTI_1"]);
    assert_eq!(
        merged.oi_array("VLTI").map(|(_, a)| a.stations.clone()),
        Some(vlti().stations)
    );
    assert_eq!(
        merged.oi_array("VLTI_1").map(|(_, a)| a.stations.clone()),
        Some(moved.stations)
    );

    let datas = data_tables(&merged);
    assert_eq!(datas.len(), 2);
    assert_eq!(datas[0].arr_name(), Some("VLTI"));
    assert_eq!(datas[1].arr_name(), Some("VLTI_1"));
}

#[test]
fn chained_target_positions_keep_their_identity() {
    let arcsec = 1.0 / 3600.0;
    let mut dir = OITarget::new();
    dir.push(1, Target::new("A", 10.0, 0.0));
    dir.push(2, Target::new("A", 10.0, 1.5 * arcsec));
    dir.push(3, Target::new("A", 10.0, 0.75 * arcsec));
    let mut file = OIFitsFile::new(v1());
    file.add_table(dir).unwrap();
    file.add_table(wavelength("LOW", &[2e-6])).unwrap();
    file.add_table(vlti()).unwrap();
    file.add_table(vis2("LOW", 1, &[(1, N1), (2, N1), (3, N1)]))
        .unwrap();

    let merged = merge_files(vec![file], &MergeParams::default()).unwrap();

    assert_eq!(
        target_names(&merged),
        vec![(1, "A".into()), (2, "A".into())]
    );
    let datas = data_tables(&merged);
    assert_eq!(datas[0].target_id(), &[1, 2, 1]);
}

#[test]
fn target_ids_are_dense() {
    let mut dir1 = OITarget::new();
    dir1.push(5, target("A"));
    let mut dup = target("A");
    dup.target = "a".into();
    dir1.push(9, dup);
    dir1.push(2, target("B"));
    let mut f1 = OIFitsFile::new(v1());
    f1.add_table(dir1).unwrap();
    f1.add_table(wavelength("LOW", &[2e-6])).unwrap();
    f1.add_table(vlti()).unwrap();
    f1.add_table(vis2("LOW", 1, &[(5, N1), (9, N1), (2, N1)]))
        .unwrap();

    let mut dir2 = OITarget::new();
    dir2.push(1, target("C"));
    dir2.push(2, target("A"));
    let mut f2 = OIFitsFile::new(v1());
    f2.add_table(dir2).unwrap();
    f2.add_table(wavelength("LOW", &[2e-6])).unwrap();
    f2.add_table(vlti()).unwrap();
    f2.add_table(vis2("LOW", 1, &[(1, N1), (2, N1)])).unwrap();

    let merged = merge_files(vec![f1, f2], &MergeParams::default()).unwrap();

    assert_eq!(
        target_names(&merged),
        vec![(1, "A".into()), (2, "B".into()), (3, "C".into())]
    );
    let datas = data_tables(&merged);
    assert_eq!(datas[0].target_id(), &[1, 1, 2]);
    assert_eq!(datas[1].target_id(), &[3, 1]);
}

#[test]
fn rows_outside_selected_night_are_removed() {
    init_tracing();
    let mut dir = OITarget::new();
    dir.push(3, target("A"));
    dir.push(4, target("B"));
    let mut file = OIFitsFile::new(v1());
    file.add_table(dir).unwrap();
    file.add_table(wavelength("LOW", &[2e-6, 2.2e-6])).unwrap();
    file.add_table(vlti()).unwrap();
    let data_id = file
        .add_table(vis2(
            "LOW",
            2,
            &[(3, N1), (4, N2), (4, N1 + 0.2), (3, N2 + 0.1)],
        ))
        .unwrap();

    let collection = OIFitsCollection::new(vec![file]);
    let tm = collection.target_manager();
    let keys = [target("A"), target("B")]
        .iter()
        .filter_map(|t| tm.key_of(t))
        .collect::<Vec<_>>();

    let mut selection = SelectorResult::new(&collection)
        .with_targets(keys)
        .with_night_ids([NightId::from_mjd(N1)]);
    selection
        .add_data(FileId::from_index(0), data_id)
        .unwrap();

    let (merged, report) = merge_with_report(&selection, &MergeParams::default()).unwrap();
    let datas = data_tables(&merged);
    assert_eq!(datas.len(), 1);

    let kept = datas[0];
    assert_eq!(kept.target_id(), &[1, 2]);
    assert!(!kept.target_id().contains(&UNDEFINED_SHORT));
    assert_mjd_close(kept.mjd(), &[N1, N1 + 0.2]);
    assert_eq!(kept.flag().nrows(), 2);
    match kept.column("VIS2DATA").map(|c| &c.values) {
        Some(ColumnValues::PerChannel(m)) => {
            assert_eq!(m.nrows(), 2);
            assert_relative_eq!(m[(0, 0)], 0.0);
            assert_relative_eq!(m[(1, 1)], 2.1, epsilon = 1e-12);
        }
        other => panic!("unexpected VIS2DATA column: {other:?}"),
    }

    assert_eq!(
        report.diagnostics(),
        &[Diagnostic::RowsFiltered {
            table: TableRef::new(FileId::from_index(0), data_id),
            kept: 2,
            total: 4,
        }]
    );
}

#[test]
fn fully_filtered_table_is_dropped() {
    let mut dir = OITarget::new();
    dir.push(1, target("A"));
    let mut file = OIFitsFile::new(v1());
    file.add_table(dir).unwrap();
    file.add_table(wavelength("LOW", &[2e-6])).unwrap();
    file.add_table(vlti()).unwrap();
    let night1 = file.add_table(vis2("LOW", 1, &[(1, N1)])).unwrap();
    let night2 = file.add_table(vis2("LOW", 1, &[(1, N2), (1, N2 + 0.1)])).unwrap();

    let collection = OIFitsCollection::new(vec![file]);
    let mut selection = SelectorResult::new(&collection)
        .with_targets(collection.target_manager().key_of(&target("A")))
        .with_night_ids([NightId::from_mjd(N1)]);
    selection.add_data(FileId::from_index(0), night1).unwrap();
    selection.add_data(FileId::from_index(0), night2).unwrap();

    let (merged, report) = merge_with_report(&selection, &MergeParams::default()).unwrap();

    let datas = data_tables(&merged);
    assert_eq!(datas.len(), 1);
    assert_eq!(datas[0].nb_rows(), 1);
    assert!(merged.oi_datas().all(|(_, d)| d.nb_rows() > 0));
    assert_eq!(
        report.diagnostics(),
        &[Diagnostic::TableDropped {
            table: TableRef::new(FileId::from_index(0), night2),
        }]
    );
}

#[test]
fn no_op_merge_round_trips() {
    let mut file = observation_file(
        OIFitsStandard::Version2,
        &["Vega", "Altair", "Deneb"],
        "GRAV_SC",
        &[2.0e-6, 2.1e-6, 2.2e-6],
        N1,
    );
    file.set_primary_hdu(OIPrimaryHDU::oifits2());
    file.add_table(OICorr::new("C1", 3, vec![1, 2], vec![2, 3], vec![0.1, 0.2]))
        .unwrap();
    file.add_table(
        OIData::new(OIDataKind::Vis, "GRAV_SC", 3, vec![2], vec![N1])
            .unwrap()
            .with_arr_name("VLTI")
            .with_corr_name("C1"),
    )
    .unwrap();
    let input = file.clone().with_file_name("input.fits");

    let merged = merge_collection(&OIFitsCollection::new(vec![input]), &MergeParams::default())
        .unwrap();

    // lookup tables are all written before the data tables
    assert_eq!(merged.version(), file.version());
    assert_eq!(merged.primary_hdu(), file.primary_hdu());
    assert_eq!(merged.oi_target(), file.oi_target());
    assert_eq!(
        merged.oi_wavelength("GRAV_SC").map(|(_, w)| w),
        file.oi_wavelength("GRAV_SC").map(|(_, w)| w)
    );
    assert_eq!(
        merged.oi_array("VLTI").map(|(_, a)| a),
        file.oi_array("VLTI").map(|(_, a)| a)
    );
    assert_eq!(
        merged.oi_corr("C1").map(|(_, c)| c),
        file.oi_corr("C1").map(|(_, c)| c)
    );
    assert_eq!(data_tables(&merged), data_tables(&file));
    assert_eq!(merged.nb_tables(), file.nb_tables());
}

#[test]
fn no_op_merge_is_structurally_equal() {
    let file = observation_file(v1(), &["A", "B"], "LOW", &[2.0e-6], N1);
    let merged = merge_files(vec![file.clone()], &MergeParams::default()).unwrap();
    assert_eq!(merged, file);
}

fn corr_file(corr: &OICorr) -> OIFitsFile {
    let mut file = observation_file(OIFitsStandard::Version2, &["A"], "LOW", &[2e-6], N1);
    file.add_table(corr.clone()).unwrap();
    let data = OIData::new(OIDataKind::Vis, "LOW", 1, vec![1], vec![N1])
        .unwrap()
        .with_arr_name("VLTI")
        .with_corr_name(corr.corr_name());
    file.add_table(data).unwrap();
    file
}

#[test]
fn correlation_tables_are_copied_by_default() {
    let corr = OICorr::new("C1", 2, vec![1], vec![2], vec![0.3]);
    let files = vec![corr_file(&corr), corr_file(&corr)];

    let merged = merge_files(files.clone(), &MergeParams::default()).unwrap();
    assert_eq!(merged.accepted_corr_names(), vec!["C1", "C1_1"]);
    let corr_refs: Vec<_> = data_tables(&merged)
        .iter()
        .filter_map(|d| d.corr_name().map(str::to_string))
        .collect();
    assert_eq!(corr_refs, vec!["C1", "C1_1"]);

    let params = MergeParams::builder().dedup_corr_tables(true).build().unwrap();
    let merged = merge_files(files, &params).unwrap();
    assert_eq!(merged.accepted_corr_names(), vec!["C1"]);
    assert!(data_tables(&merged)
        .iter()
        .filter_map(|d| d.corr_name())
        .all(|name| name == "C1"));
}

#[test]
fn v1_output_drops_correlation_references() {
    let corr = OICorr::new("C1", 2, vec![1], vec![2], vec![0.3]);
    let collection = OIFitsCollection::new(vec![corr_file(&corr)]);
    let params = MergeParams::builder()
        .output_version(OIFitsStandard::Version1)
        .build()
        .unwrap();

    let (merged, report) = merge_with_report(&collection.select_all(), &params).unwrap();
    assert!(merged.accepted_corr_names().is_empty());
    assert!(data_tables(&merged).iter().all(|d| d.corr_name().is_none()));
    assert_eq!(
        report.count(|d| matches!(
            d,
            Diagnostic::ReferenceDegraded { ext_name, .. } if *ext_name == OI_CORR
        )),
        1
    );
}

#[test]
fn unresolvable_insname_skips_table() {
    let mut file = observation_file(v1(), &["A"], "LOW", &[2e-6], N1);
    let orphan = file.add_table(vis2("HIGH", 1, &[(1, N1)])).unwrap();

    let collection = OIFitsCollection::new(vec![file]);
    let (merged, report) =
        merge_with_report(&collection.select_all(), &MergeParams::default()).unwrap();

    assert_eq!(data_tables(&merged).len(), 1);
    assert_eq!(
        report.diagnostics(),
        &[Diagnostic::ReferenceUnresolvable {
            table: TableRef::new(FileId::from_index(0), orphan),
            ins_name: "HIGH".into(),
        }]
    );
}

#[test]
fn extra_target_ids_warn_once_per_file() {
    let mut file = observation_file(v1(), &["A"], "LOW", &[2e-6], N1);
    file.add_table(vis2("LOW", 1, &[(1, N1), (7, N1)])).unwrap();
    file.add_table(vis2("LOW", 1, &[(7, N1), (1, N1 + 0.1)])).unwrap();

    let collection = OIFitsCollection::new(vec![file]);
    let (merged, report) =
        merge_with_report(&collection.select_all(), &MergeParams::default()).unwrap();

    let datas = data_tables(&merged);
    assert_eq!(datas.len(), 3);
    assert!(datas.iter().all(|d| d.target_id() == [1]));
    assert_eq!(
        report.count(|d| matches!(d, Diagnostic::ExtraTargetId { target_id: 7, .. })),
        1
    );
    assert_eq!(
        report.count(|d| matches!(d, Diagnostic::RowsFiltered { kept: 1, total: 2, .. })),
        2
    );
}

#[test]
fn file_without_target_table_loses_its_data() {
    let mut orphan = OIFitsFile::new(v1());
    orphan.add_table(wavelength("LOW", &[2e-6])).unwrap();
    orphan.add_table(vis2("LOW", 1, &[(1, N1)])).unwrap();
    let file = observation_file(v1(), &["A"], "LOW", &[2e-6], N1);

    let collection = OIFitsCollection::new(vec![file, orphan]);
    let (merged, report) =
        merge_with_report(&collection.select_all(), &MergeParams::default()).unwrap();

    assert_eq!(data_tables(&merged).len(), 1);
    assert!(report.diagnostics().contains(&Diagnostic::TableDropped {
        table: TableRef::new(FileId::from_index(1), TableId::from_index(1)),
    }));
}

#[test]
fn empty_inputs_are_rejected() {
    assert_eq!(
        merge_files(Vec::new(), &MergeParams::default()),
        Err(MergeError::InvalidInput("Missing OIFits inputs".into()))
    );

    let file = observation_file(v1(), &["A"], "LOW", &[2e-6], N1);
    let collection = OIFitsCollection::new(vec![file]);
    assert!(matches!(
        merge(&SelectorResult::new(&collection), &MergeParams::default()),
        Err(MergeError::InvalidInput(_))
    ));
}

#[test]
fn params_load_from_json() {
    let params = MergeParams::builder()
        .output_version(OIFitsStandard::Version2)
        .dedup_corr_tables(true)
        .target_tolerance_arcsec(0.5)
        .build()
        .unwrap();

    let json = serde_json::to_string(&params).unwrap();
    assert_eq!(
        json,
        r#"{"output_version":"V2","dedup_corr_tables":true,"target_tolerance_arcsec":0.5}"#
    );
    let back: MergeParams = serde_json::from_str(&json).unwrap();
    assert_eq!(back, params);
    assert_eq!(back.validate(), Ok(()));
}
