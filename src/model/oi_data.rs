//! # Data tables (OI_VIS, OI_VIS2, OI_T3, OI_FLUX)
//!
//! An [`OIData`] holds measurement rows. Every row carries the keys the merge engine works
//! with (TARGET_ID, MJD, STA_INDEX) plus a per-channel FLAG mask and any number of named
//! measurement columns ([`DataColumn`]), stored column-wise:
//!
//! ```text
//!            TARGET_ID  MJD   STA_INDEX   FLAG[nwave]   VIS2DATA[nwave]  ...
//! row 0      1          ...   [1, 2]      [F F T]       [...]
//! row 1      2          ...   [1, 3]      [F F F]       [...]
//! ```
//!
//! Per-channel columns are `nrows × nwave` matrices, so compacting a table down to a subset
//! of rows is a single `select_rows` per column.
//!
//! Lookup tables are referenced **by name** (INSNAME, ARRNAME, CORRNAME) and resolved within
//! the file owning the table.

use std::fmt;

use itertools::Itertools;
use nalgebra::{DMatrix, DVector};
use smallvec::SmallVec;

use crate::{
    constants::{StaIndex, TargetId, MJD},
    oimerge_errors::MergeError,
};

use super::{Keywords, NightId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OIDataKind {
    Vis,
    Vis2,
    T3,
    Flux,
}

impl OIDataKind {
    pub fn ext_name(&self) -> &'static str {
        match self {
            OIDataKind::Vis => "OI_VIS",
            OIDataKind::Vis2 => "OI_VIS2",
            OIDataKind::T3 => "OI_T3",
            OIDataKind::Flux => "OI_FLUX",
        }
    }

    /// Number of stations combined in one row (2 for baselines, 3 for closure triangles).
    pub fn nb_stations(&self) -> usize {
        match self {
            OIDataKind::Vis | OIDataKind::Vis2 => 2,
            OIDataKind::T3 => 3,
            OIDataKind::Flux => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// One value per row (e.g. UCOORD)
    PerRow(DVector<f64>),
    /// One value per row and channel (e.g. VIS2DATA)
    PerChannel(DMatrix<f64>),
}

impl ColumnValues {
    pub fn nrows(&self) -> usize {
        match self {
            ColumnValues::PerRow(v) => v.nrows(),
            ColumnValues::PerChannel(m) => m.nrows(),
        }
    }

    fn select_rows(&self, rows: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::PerRow(v) => ColumnValues::PerRow(v.select_rows(rows.iter())),
            ColumnValues::PerChannel(m) => ColumnValues::PerChannel(m.select_rows(rows.iter())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataColumn {
    pub name: String,
    pub unit: Option<String>,
    pub values: ColumnValues,
}

impl DataColumn {
    pub fn per_row(name: impl Into<String>, values: Vec<f64>) -> Self {
        DataColumn {
            name: name.into(),
            unit: None,
            values: ColumnValues::PerRow(DVector::from_vec(values)),
        }
    }

    pub fn per_channel(name: impl Into<String>, values: DMatrix<f64>) -> Self {
        DataColumn {
            name: name.into(),
            unit: None,
            values: ColumnValues::PerChannel(values),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OIData {
    kind: OIDataKind,
    ins_name: String,
    arr_name: Option<String>,
    corr_name: Option<String>,
    pub date_obs: String,
    pub keywords: Keywords,
    nwave: usize,
    target_id: Vec<TargetId>,
    time: Vec<f64>,
    mjd: Vec<MJD>,
    int_time: Vec<f64>,
    sta_index: Vec<SmallVec<[StaIndex; 3]>>,
    flag: DMatrix<bool>,
    columns: Vec<DataColumn>,
}

impl OIData {
    /// Create a data table from its mandatory row keys.
    ///
    /// TIME is derived from MJD (seconds since 0h UT of the MJD day), INT_TIME is zero,
    /// STA_INDEX is empty and no channel is flagged. Use the `with_*` methods to fill the
    /// remaining columns.
    ///
    /// Arguments
    /// -----------------
    /// * `kind`: table flavour (VIS, VIS2, T3, FLUX).
    /// * `ins_name`: INSNAME of the OI_WAVELENGTH table defining the channels.
    /// * `nwave`: number of spectral channels.
    /// * `target_id`: TARGET_ID column.
    /// * `mjd`: MJD column, same length as `target_id`.
    ///
    /// Return
    /// ----------
    /// * The new table, or [`MergeError::InconsistentColumn`] if the lengths differ.
    pub fn new(
        kind: OIDataKind,
        ins_name: impl Into<String>,
        nwave: usize,
        target_id: Vec<TargetId>,
        mjd: Vec<MJD>,
    ) -> Result<Self, MergeError> {
        let nrows = target_id.len();
        check_rows("MJD", nrows, mjd.len())?;

        Ok(OIData {
            kind,
            ins_name: ins_name.into(),
            arr_name: None,
            corr_name: None,
            date_obs: String::new(),
            keywords: Keywords::new(),
            nwave,
            time: mjd.iter().map(|m| m.fract() * 86_400.0).collect(),
            int_time: vec![0.0; nrows],
            sta_index: vec![SmallVec::new(); nrows],
            flag: DMatrix::from_element(nrows, nwave, false),
            columns: Vec::new(),
            target_id,
            mjd,
        })
    }

    pub fn with_arr_name(mut self, arr_name: impl Into<String>) -> Self {
        self.arr_name = Some(arr_name.into());
        self
    }

    pub fn with_corr_name(mut self, corr_name: impl Into<String>) -> Self {
        self.corr_name = Some(corr_name.into());
        self
    }

    pub fn with_sta_index(
        mut self,
        sta_index: Vec<SmallVec<[StaIndex; 3]>>,
    ) -> Result<Self, MergeError> {
        check_rows("STA_INDEX", self.nb_rows(), sta_index.len())?;
        self.sta_index = sta_index;
        Ok(self)
    }

    pub fn with_int_time(mut self, int_time: Vec<f64>) -> Result<Self, MergeError> {
        check_rows("INT_TIME", self.nb_rows(), int_time.len())?;
        self.int_time = int_time;
        Ok(self)
    }

    pub fn with_flags(mut self, flag: DMatrix<bool>) -> Result<Self, MergeError> {
        check_rows("FLAG", self.nb_rows(), flag.nrows())?;
        check_channels("FLAG", self.nwave, flag.ncols())?;
        self.flag = flag;
        Ok(self)
    }

    pub fn with_column(mut self, column: DataColumn) -> Result<Self, MergeError> {
        check_rows(&column.name, self.nb_rows(), column.values.nrows())?;
        if let ColumnValues::PerChannel(m) = &column.values {
            check_channels(&column.name, self.nwave, m.ncols())?;
        }
        self.columns.push(column);
        Ok(self)
    }

    pub fn kind(&self) -> OIDataKind {
        self.kind
    }

    pub fn ins_name(&self) -> &str {
        &self.ins_name
    }

    pub fn arr_name(&self) -> Option<&str> {
        self.arr_name.as_deref()
    }

    pub fn corr_name(&self) -> Option<&str> {
        self.corr_name.as_deref()
    }

    pub fn nb_rows(&self) -> usize {
        self.target_id.len()
    }

    pub fn nwave(&self) -> usize {
        self.nwave
    }

    pub fn target_id(&self) -> &[TargetId] {
        &self.target_id
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn mjd(&self) -> &[MJD] {
        &self.mjd
    }

    pub fn int_time(&self) -> &[f64] {
        &self.int_time
    }

    pub fn sta_index(&self) -> &[SmallVec<[StaIndex; 3]>] {
        &self.sta_index
    }

    pub fn flag(&self) -> &DMatrix<bool> {
        &self.flag
    }

    pub fn columns(&self) -> &[DataColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Distinct TARGET_ID values, in order of first appearance.
    pub fn distinct_target_ids(&self) -> Vec<TargetId> {
        self.target_id.iter().copied().unique().collect()
    }

    /// Night of every row.
    pub fn night_ids(&self) -> Vec<NightId> {
        self.mjd.iter().map(|&m| NightId::from_mjd(m)).collect()
    }

    /// Distinct nights, in order of first appearance.
    pub fn distinct_night_ids(&self) -> Vec<NightId> {
        self.mjd
            .iter()
            .map(|&m| NightId::from_mjd(m))
            .unique()
            .collect()
    }

    /// The night shared by every row, if the table spans exactly one night.
    pub fn single_night(&self) -> Option<NightId> {
        match self.distinct_night_ids().as_slice() {
            [night] => Some(*night),
            _ => None,
        }
    }

    /// Copy of this table restricted to the given rows (in the given order).
    ///
    /// All row-indexed columns are compacted together, including FLAG and the measurement
    /// columns; header keywords and lookup-table names are kept.
    pub fn select_rows(&self, rows: &[usize]) -> OIData {
        OIData {
            kind: self.kind,
            ins_name: self.ins_name.clone(),
            arr_name: self.arr_name.clone(),
            corr_name: self.corr_name.clone(),
            date_obs: self.date_obs.clone(),
            keywords: self.keywords.clone(),
            nwave: self.nwave,
            target_id: pick(&self.target_id, rows),
            time: pick(&self.time, rows),
            mjd: pick(&self.mjd, rows),
            int_time: pick(&self.int_time, rows),
            sta_index: pick(&self.sta_index, rows),
            flag: DMatrix::from_fn(rows.len(), self.nwave, |r, c| self.flag[(rows[r], c)]),
            columns: self
                .columns
                .iter()
                .map(|c| DataColumn {
                    name: c.name.clone(),
                    unit: c.unit.clone(),
                    values: c.values.select_rows(rows),
                })
                .collect(),
        }
    }

    /// Replace the lookup-table references.
    pub fn set_names(
        &mut self,
        ins_name: impl Into<String>,
        arr_name: impl Into<String>,
        corr_name: Option<String>,
    ) {
        self.ins_name = ins_name.into();
        self.arr_name = Some(arr_name.into());
        self.corr_name = corr_name;
    }

    /// Replace the TARGET_ID column.
    pub fn set_target_id(&mut self, target_id: Vec<TargetId>) -> Result<(), MergeError> {
        check_rows("TARGET_ID", self.nb_rows(), target_id.len())?;
        self.target_id = target_id;
        Ok(())
    }
}

impl fmt::Display for OIData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}][{}]({} rows × {} channels)",
            self.kind.ext_name(),
            self.ins_name,
            self.arr_name.as_deref().unwrap_or("-"),
            self.nb_rows(),
            self.nwave
        )
    }
}

fn pick<T: Clone>(values: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|&i| values[i].clone()).collect()
}

fn check_rows(column: &str, expected: usize, actual: usize) -> Result<(), MergeError> {
    if expected != actual {
        return Err(MergeError::InconsistentColumn {
            column: column.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_channels(column: &str, nwave: usize, ncols: usize) -> Result<(), MergeError> {
    if nwave != ncols {
        return Err(MergeError::InconsistentColumn {
            column: format!("{column} (channels)"),
            expected: nwave,
            actual: ncols,
        });
    }
    Ok(())
}
