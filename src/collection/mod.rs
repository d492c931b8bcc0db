//! # Collections of OIFITS files
//!
//! An [`OIFitsCollection`] owns the input files of a merge and the [`TargetManager`] that
//! resolves target identity across them. Tables of the collection are addressed with
//! [`TableRef`] handles (`file handle + table handle`), which are `Copy`, hashable and never
//! alias: the same local name or identifier in two files yields two distinct handles.
//!
//! A [`SelectorResult`] is the outcome of filtering a collection: the selected data tables,
//! plus the distinct targets and nights implied by the selection. Matching logic that
//! produces a filtered result lives outside this crate; [`OIFitsCollection::select_all`]
//! builds the result that keeps everything.
//!
//! ## See also
//! ------------
//! * [`target_manager`] – Target identity and the [`TargetResolver`] trait.
//! * [`selector_result`] – Selection input of the merge engine.
//! * [`crate::processing::merger`] – Consumer of the selection.

pub mod selector_result;
pub mod target_manager;

use std::fmt;

use itertools::Itertools;

use crate::{
    constants::ArcSec,
    model::{NightId, OIData, OIFitsFile, OITable, TableId},
};

pub use selector_result::SelectorResult;
pub use target_manager::{TargetKey, TargetManager, TargetResolver};

/// Handle of a file inside one [`OIFitsCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub(crate) usize);

impl FileId {
    /// Handle of the `index`-th file (0-based).
    pub fn from_index(index: usize) -> Self {
        FileId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Handle of a table of a collection: the owning file and the table inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub file: FileId,
    pub table: TableId,
}

impl TableRef {
    pub fn new(file: FileId, table: TableId) -> Self {
        TableRef { file, table }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.file.0, self.table.index())
    }
}

#[derive(Debug, Clone)]
pub struct OIFitsCollection {
    files: Vec<OIFitsFile>,
    target_manager: TargetManager,
}

impl OIFitsCollection {
    /// Build a collection, registering the targets of every file with the default tolerance.
    pub fn new(files: Vec<OIFitsFile>) -> Self {
        Self::with_target_manager(files, TargetManager::default())
    }

    /// Build a collection whose targets match within `tolerance_arcsec`.
    pub fn with_target_tolerance(files: Vec<OIFitsFile>, tolerance_arcsec: ArcSec) -> Self {
        Self::with_target_manager(files, TargetManager::new(tolerance_arcsec))
    }

    fn with_target_manager(files: Vec<OIFitsFile>, mut target_manager: TargetManager) -> Self {
        for entry in files
            .iter()
            .filter_map(OIFitsFile::oi_target)
            .flat_map(|dir| dir.entries())
        {
            target_manager.register(&entry.target);
        }
        OIFitsCollection {
            files,
            target_manager,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &OIFitsFile)> {
        self.files
            .iter()
            .enumerate()
            .map(|(idx, file)| (FileId(idx), file))
    }

    pub fn file(&self, id: FileId) -> Option<&OIFitsFile> {
        self.files.get(id.0)
    }

    pub fn target_manager(&self) -> &TargetManager {
        &self.target_manager
    }

    pub fn table(&self, table_ref: TableRef) -> Option<&OITable> {
        self.file(table_ref.file)
            .and_then(|file| file.table(table_ref.table))
    }

    pub fn oi_data(&self, table_ref: TableRef) -> Option<&OIData> {
        self.table(table_ref).and_then(OITable::as_data)
    }

    /// Selection keeping every data table of the collection.
    ///
    /// Targets are the distinct sources referenced by the data rows and nights the distinct
    /// nights of the data rows, both in order of first appearance (file order, then table
    /// order, then row order). Row identifiers missing from their file's OI_TARGET table do
    /// not contribute a target.
    pub fn select_all(&self) -> SelectorResult<'_> {
        let mut data = Vec::new();
        let mut targets = Vec::new();
        let mut nights: Vec<NightId> = Vec::new();

        for (file_id, file) in self.files() {
            for (table_id, oi_data) in file.oi_datas() {
                data.push(TableRef::new(file_id, table_id));

                if let Some(dir) = file.oi_target() {
                    targets.extend(
                        oi_data
                            .distinct_target_ids()
                            .into_iter()
                            .filter_map(|id| dir.target(id))
                            .filter_map(|t| self.target_manager.key_of(t)),
                    );
                }
                nights.extend(oi_data.distinct_night_ids());
            }
        }

        SelectorResult::from_parts(
            self,
            data,
            targets.into_iter().unique().collect(),
            nights.into_iter().unique().collect(),
        )
    }
}

impl From<Vec<OIFitsFile>> for OIFitsCollection {
    fn from(files: Vec<OIFitsFile>) -> Self {
        OIFitsCollection::new(files)
    }
}
