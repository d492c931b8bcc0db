//! # Merge engine
//!
//! Combines the data tables of a [`SelectorResult`] into one new [`OIFitsFile`] with consistent
//! references: one OI_TARGET table with dense identifiers, deduplicated lookup tables, and data
//! tables compacted to the rows that remain valid.
//!
//! ## Pipeline
//!
//! 1. **Output creation**: the output revision is [`MergeParams::output_version`] or the
//!    highest revision of the files owning the selected data. OIFITS v2 outputs get a primary
//!    header with `CONTENT = 'OIFITS2'`.
//! 2. **Table collection**: one pass over the selected data tables records the referenced
//!    OI_TARGET, OI_WAVELENGTH, OI_ARRAY and OI_CORR tables, in first-seen order.
//! 3. **Targets**: [`unify_targets`] writes the output OI_TARGET table and the per-file
//!    identifier mappings.
//! 4. **Lookup tables**: [`place_table`] copies or reuses OI_WAVELENGTH, then OI_ARRAY, then
//!    (OIFITS v2 outputs only) OI_CORR tables.
//! 5. **Data**: every selected data table is planned and materialized by the row filter, and
//!    appended unless no row survives.
//!
//! The inputs are never modified. All mapping state lives in a context owned by one call, so
//! concurrent merges share nothing.
//!
//! ## Failure policy
//!
//! Only an empty input or an invalid parameter set fails the call with [`MergeError`]. Every
//! other condition is logged with `tracing`, recorded in the [`MergeReport`] and absorbed:
//!
//! | Condition                      | Effect                                   |
//! |--------------------------------|------------------------------------------|
//! | INSNAME not resolvable         | data table skipped                       |
//! | ARRNAME not resolvable         | ARRNAME set to `UNDEFINED`, table kept   |
//! | CORRNAME not resolvable        | CORRNAME removed, table kept             |
//! | TARGET_ID without target       | rows removed                             |
//! | night not selected             | rows removed                             |
//! | no remaining row               | data table dropped                       |
//!
//! ## Example
//!
//! ```rust
//! use oimerge::model::{OIData, OIDataKind, OIFitsFile, OIFitsStandard, OITarget, OIWavelength, Target};
//! use oimerge::processing::{merge_params::MergeParams, merger::merge_files};
//!
//! let mut file = OIFitsFile::new(OIFitsStandard::Version1);
//! let mut targets = OITarget::new();
//! targets.push(1, Target::new("Vega", 279.23, 38.78));
//! file.add_table(targets)?;
//! file.add_table(OIWavelength::new("LOW", vec![2.2e-6], vec![1e-7]))?;
//! file.add_table(OIData::new(OIDataKind::Vis2, "LOW", 1, vec![1], vec![58000.2])?)?;
//!
//! let merged = merge_files(vec![file.clone(), file], &MergeParams::default())?;
//! assert_eq!(merged.accepted_ins_names(), vec!["LOW"]);
//! # Ok::<(), oimerge::oimerge_errors::MergeError>(())
//! ```

use ahash::AHashMap;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    collection::{FileId, OIFitsCollection, SelectorResult, TableRef},
    constants::{TargetId, OI_ARRAY, OI_CORR, UNDEFINED, UNDEFINED_SHORT},
    model::{
        NightIdMatcher, OIArray, OICorr, OIData, OIFitsFile, OIFitsStandard, OIPrimaryHDU,
        OITarget, OIWavelength, TableId,
    },
    oimerge_errors::MergeError,
};

use super::{
    id_remapper::IdRemapper,
    lookup_dedup::{place_table, DedupPolicy, LookupTable},
    merge_params::MergeParams,
    report::{Diagnostic, MergeReport},
    row_filter::{materialize, plan_rows, OutputNames},
    target_unifier::unify_targets,
};

/// Merge the selected data into a new file.
///
/// Return
/// ----------
/// * The merged file, or [`MergeError::InvalidInput`] if the selection holds no data table.
pub fn merge(
    selection: &SelectorResult<'_>,
    params: &MergeParams,
) -> Result<OIFitsFile, MergeError> {
    merge_with_report(selection, params).map(|(output, _)| output)
}

/// Same as [`merge`], also returning the diagnostics of the recoverable conditions met.
pub fn merge_with_report(
    selection: &SelectorResult<'_>,
    params: &MergeParams,
) -> Result<(OIFitsFile, MergeReport), MergeError> {
    params.validate()?;
    if selection.is_empty() {
        return Err(MergeError::InvalidInput(
            "Missing OIData tables in selection".into(),
        ));
    }

    let mut ctx = MergeContext::new(selection, params);
    info!(
        version = %ctx.output.version(),
        oi_datas = selection.data_refs().len(),
        targets = selection.distinct_targets().len(),
        night_ids = ?selection.distinct_night_ids(),
        "merging selection"
    );

    let used = ctx.collect_tables();
    ctx.process_oi_target(&used.target_files)?;

    ctx.ins_names =
        ctx.process_lookups::<OIWavelength>(&used.wavelengths, DedupPolicy::ReuseIdentical)?;
    ctx.arr_names = ctx.process_lookups::<OIArray>(&used.arrays, DedupPolicy::ReuseIdentical)?;
    if ctx.output.version().supports_corr() {
        let policy = if params.dedup_corr_tables {
            DedupPolicy::ReuseIdentical
        } else {
            DedupPolicy::AlwaysCopy
        };
        ctx.corr_names = ctx.process_lookups::<OICorr>(&used.corrs, policy)?;
    }
    info!(ins_names = ?ctx.output.accepted_ins_names(), "accepted OI_WAVELENGTH tables");
    info!(arr_names = ?ctx.output.accepted_arr_names(), "accepted OI_ARRAY tables");
    if ctx.output.version().supports_corr() {
        info!(corr_names = ?ctx.output.accepted_corr_names(), "accepted OI_CORR tables");
    }

    ctx.process_oi_data()?;

    Ok((ctx.output, ctx.report))
}

/// Merge every data table of `collection`.
pub fn merge_collection(
    collection: &OIFitsCollection,
    params: &MergeParams,
) -> Result<OIFitsFile, MergeError> {
    if collection.is_empty() {
        return Err(MergeError::InvalidInput("Missing OIFits inputs".into()));
    }
    merge(&collection.select_all(), params)
}

/// Merge whole files, matching targets with [`MergeParams::target_tolerance_arcsec`].
pub fn merge_files(files: Vec<OIFitsFile>, params: &MergeParams) -> Result<OIFitsFile, MergeError> {
    params.validate()?;
    if files.is_empty() {
        return Err(MergeError::InvalidInput("Missing OIFits inputs".into()));
    }
    let collection = OIFitsCollection::with_target_tolerance(files, params.target_tolerance_arcsec);
    merge_collection(&collection, params)
}

/// Tables referenced by the selected data, in first-seen order.
#[derive(Debug, Default)]
struct UsedTables {
    target_files: Vec<FileId>,
    wavelengths: Vec<TableRef>,
    arrays: Vec<TableRef>,
    corrs: Vec<TableRef>,
}

/// Mapping state of one merge call.
struct MergeContext<'s, 'c> {
    selection: &'s SelectorResult<'c>,
    collection: &'c OIFitsCollection,
    output: OIFitsFile,
    target_ids: IdRemapper<FileId, TargetId>,
    ins_names: AHashMap<TableRef, String>,
    arr_names: AHashMap<TableRef, String>,
    corr_names: AHashMap<TableRef, String>,
    report: MergeReport,
}

impl<'s, 'c> MergeContext<'s, 'c> {
    fn new(selection: &'s SelectorResult<'c>, params: &MergeParams) -> Self {
        let version = params.output_version.unwrap_or_else(|| {
            OIFitsStandard::highest(
                selection
                    .sorted_files()
                    .into_iter()
                    .filter_map(|id| selection.file(id))
                    .map(OIFitsFile::version),
            )
        });

        let mut output = OIFitsFile::new(version);
        if version == OIFitsStandard::Version2 {
            output.set_primary_hdu(OIPrimaryHDU::oifits2());
        }

        MergeContext {
            selection,
            collection: selection.collection(),
            output,
            target_ids: IdRemapper::new(UNDEFINED_SHORT),
            ins_names: AHashMap::new(),
            arr_names: AHashMap::new(),
            corr_names: AHashMap::new(),
            report: MergeReport::new(),
        }
    }

    fn collect_tables(&self) -> UsedTables {
        let mut used = UsedTables::default();

        for (data_ref, data) in self.selection.sorted_oi_datas() {
            let Some(file) = self.collection.file(data_ref.file) else {
                continue;
            };
            let at = |id: TableId| TableRef::new(data_ref.file, id);

            used.target_files.push(data_ref.file);
            if let Some((id, _)) = file.oi_wavelength(data.ins_name()) {
                used.wavelengths.push(at(id));
            }
            if let Some((id, _)) = data.arr_name().and_then(|name| file.oi_array(name)) {
                used.arrays.push(at(id));
            }
            if let Some((id, _)) = data.corr_name().and_then(|name| file.oi_corr(name)) {
                used.corrs.push(at(id));
            }
        }

        UsedTables {
            target_files: used.target_files.into_iter().unique().collect(),
            wavelengths: used.wavelengths.into_iter().unique().collect(),
            arrays: used.arrays.into_iter().unique().collect(),
            corrs: used.corrs.into_iter().unique().collect(),
        }
    }

    fn process_oi_target(&mut self, target_files: &[FileId]) -> Result<(), MergeError> {
        let collection = self.collection;

        let mut directories: Vec<(FileId, &OITarget)> = Vec::with_capacity(target_files.len());
        for file_id in target_files {
            // a file without OI_TARGET keeps an empty scope: all its identifiers are extras
            self.target_ids.open_scope(*file_id);
            if let Some(dir) = collection.file(*file_id).and_then(OIFitsFile::oi_target) {
                directories.push((*file_id, dir));
            }
        }

        let oi_target = unify_targets(
            collection.target_manager(),
            self.selection.distinct_targets(),
            &directories,
            self.output.version(),
            &mut self.target_ids,
        )?;
        debug!(nb_targets = oi_target.len(), "OI_TARGET created");

        self.output.add_table(oi_target)?;
        Ok(())
    }

    fn process_lookups<T: LookupTable>(
        &mut self,
        refs: &[TableRef],
        policy: DedupPolicy,
    ) -> Result<AHashMap<TableRef, String>, MergeError> {
        let collection = self.collection;
        let mut names = AHashMap::with_capacity(refs.len());

        for table_ref in refs {
            let Some(table) = collection.table(*table_ref).and_then(T::downcast) else {
                continue;
            };
            let placement = place_table(&mut self.output, table, policy)?;

            if placement.reused {
                debug!(
                    ext_name = T::EXT_NAME,
                    table = %table_ref,
                    name = %placement.name,
                    "same table reused"
                );
                self.report.push(Diagnostic::IdenticalTable {
                    ext_name: T::EXT_NAME,
                    table: *table_ref,
                    output_name: placement.name.clone(),
                });
            }
            names.insert(*table_ref, placement.name);
        }
        Ok(names)
    }

    fn process_oi_data(&mut self) -> Result<(), MergeError> {
        let selection = self.selection;
        let collection = self.collection;
        let nights = NightIdMatcher::new(selection.distinct_night_ids());

        for (data_ref, data) in selection.sorted_oi_datas() {
            let Some(file) = collection.file(data_ref.file) else {
                continue;
            };
            let Some(names) = self.output_names(data_ref, data, file) else {
                continue;
            };

            let plan = plan_rows(
                data_ref,
                data,
                data_ref.file,
                &mut self.target_ids,
                &nights,
                &mut self.report,
            );
            if let Some(table) = materialize(data, plan, names)? {
                self.output.add_table(table)?;
            }
        }
        Ok(())
    }

    /// New lookup names of a data table, `None` if its channels cannot be resolved.
    fn output_names(
        &mut self,
        data_ref: TableRef,
        data: &OIData,
        file: &OIFitsFile,
    ) -> Option<OutputNames> {
        let mapped = |names: &AHashMap<TableRef, String>, id: Option<TableId>| {
            id.and_then(|id| names.get(&TableRef::new(data_ref.file, id)))
                .cloned()
        };

        let Some(ins_name) = mapped(
            &self.ins_names,
            file.oi_wavelength(data.ins_name()).map(|(id, _)| id),
        ) else {
            warn!(
                table = %data_ref,
                ins_name = data.ins_name(),
                "invalid INSNAME found, table skipped"
            );
            self.report.push(Diagnostic::ReferenceUnresolvable {
                table: data_ref,
                ins_name: data.ins_name().to_string(),
            });
            return None;
        };

        let arr_name = match mapped(
            &self.arr_names,
            data.arr_name()
                .and_then(|name| file.oi_array(name))
                .map(|(id, _)| id),
        ) {
            Some(name) => name,
            None => {
                let old = data.arr_name().unwrap_or_default();
                warn!(
                    table = %data_ref,
                    arr_name = old,
                    substitute = UNDEFINED,
                    "invalid ARRNAME found"
                );
                self.report.push(Diagnostic::ReferenceDegraded {
                    table: data_ref,
                    ext_name: OI_ARRAY,
                    name: old.to_string(),
                    substitute: Some(UNDEFINED.to_string()),
                });
                UNDEFINED.to_string()
            }
        };

        let corr_name = match data.corr_name() {
            None => None,
            Some(old) => {
                let name = mapped(&self.corr_names, file.oi_corr(old).map(|(id, _)| id));
                if name.is_none() {
                    warn!(
                        table = %data_ref,
                        corr_name = old,
                        "invalid CORRNAME found, reference removed"
                    );
                    self.report.push(Diagnostic::ReferenceDegraded {
                        table: data_ref,
                        ext_name: OI_CORR,
                        name: old.to_string(),
                        substitute: None,
                    });
                }
                name
            }
        };

        Some(OutputNames {
            ins_name,
            arr_name,
            corr_name,
        })
    }
}
