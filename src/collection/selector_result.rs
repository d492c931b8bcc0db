use std::fmt;

use itertools::Itertools;

use crate::{
    model::{NightId, OIData, OIFitsFile, TableId},
    oimerge_errors::MergeError,
};

use super::{FileId, OIFitsCollection, TableRef, TargetKey};

/// Selection of a collection handed to the merge engine.
///
/// Holds, in selection order:
/// * the selected data tables,
/// * the distinct selected targets (as collection-wide [`TargetKey`]s),
/// * the distinct selected nights.
///
/// An empty night list means "no night constraint".
#[derive(Debug, Clone)]
pub struct SelectorResult<'a> {
    collection: &'a OIFitsCollection,
    data: Vec<TableRef>,
    targets: Vec<TargetKey>,
    night_ids: Vec<NightId>,
}

impl<'a> SelectorResult<'a> {
    /// Empty selection over `collection`, to be filled by an external selector.
    pub fn new(collection: &'a OIFitsCollection) -> Self {
        Self::from_parts(collection, Vec::new(), Vec::new(), Vec::new())
    }

    pub(crate) fn from_parts(
        collection: &'a OIFitsCollection,
        data: Vec<TableRef>,
        targets: Vec<TargetKey>,
        night_ids: Vec<NightId>,
    ) -> Self {
        SelectorResult {
            collection,
            data,
            targets,
            night_ids,
        }
    }

    /// Add a data table to the selection (ignored if already selected).
    ///
    /// Return
    /// ----------
    /// * [`MergeError::UnknownTable`] if the handle does not designate a data table of the
    ///   collection.
    pub fn add_data(&mut self, file: FileId, table: TableId) -> Result<(), MergeError> {
        let table_ref = TableRef::new(file, table);
        if self.collection.oi_data(table_ref).is_none() {
            return Err(MergeError::UnknownTable {
                file: file.index(),
                table: table.index(),
            });
        }
        if !self.data.contains(&table_ref) {
            self.data.push(table_ref);
        }
        Ok(())
    }

    /// Replace the selected targets; duplicates are dropped, first occurrence wins.
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = TargetKey>) -> Self {
        self.targets = targets.into_iter().unique().collect();
        self
    }

    /// Replace the selected nights; duplicates are dropped, first occurrence wins.
    pub fn with_night_ids(mut self, night_ids: impl IntoIterator<Item = NightId>) -> Self {
        self.night_ids = night_ids.into_iter().unique().collect();
        self
    }

    pub fn collection(&self) -> &'a OIFitsCollection {
        self.collection
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data_refs(&self) -> &[TableRef] {
        &self.data
    }

    /// Selected data tables with their handles, in selection order.
    pub fn sorted_oi_datas(&self) -> impl Iterator<Item = (TableRef, &'a OIData)> + '_ {
        let collection = self.collection;
        self.data
            .iter()
            .filter_map(move |r| collection.oi_data(*r).map(|data| (*r, data)))
    }

    pub fn distinct_targets(&self) -> &[TargetKey] {
        &self.targets
    }

    pub fn distinct_night_ids(&self) -> &[NightId] {
        &self.night_ids
    }

    /// Distinct files owning the selected data tables, in collection order.
    pub fn sorted_files(&self) -> Vec<FileId> {
        self.data.iter().map(|r| r.file).sorted().dedup().collect()
    }

    pub fn file(&self, id: FileId) -> Option<&'a OIFitsFile> {
        self.collection.file(id)
    }
}

impl fmt::Display for SelectorResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SelectorResult(files={}, oiDatas=[{}], targets={}, nightIds=[{}])",
            self.sorted_files().len(),
            self.data.iter().join(", "),
            self.targets.len(),
            self.night_ids.iter().join(", ")
        )
    }
}
