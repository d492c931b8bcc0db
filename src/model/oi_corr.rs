use super::Keywords;

/// OI_CORR table (OIFITS v2): sparse correlation matrix between data values, named by
/// CORRNAME. Only the upper-triangle entries listed in IINDX/JINDX are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct OICorr {
    corr_name: String,
    /// Dimension of the full correlation matrix
    pub ndata: i32,
    pub iindx: Vec<i32>,
    pub jindx: Vec<i32>,
    pub corr: Vec<f64>,
    pub keywords: Keywords,
}

impl OICorr {
    pub fn new(
        corr_name: impl Into<String>,
        ndata: i32,
        iindx: Vec<i32>,
        jindx: Vec<i32>,
        corr: Vec<f64>,
    ) -> Self {
        OICorr {
            corr_name: corr_name.into(),
            ndata,
            iindx,
            jindx,
            corr,
            keywords: Keywords::new(),
        }
    }

    pub fn corr_name(&self) -> &str {
        &self.corr_name
    }

    pub fn set_corr_name(&mut self, corr_name: impl Into<String>) {
        self.corr_name = corr_name.into();
    }

    /// Number of stored correlation coefficients.
    pub fn len(&self) -> usize {
        self.corr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corr.is_empty()
    }
}
