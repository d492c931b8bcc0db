use crate::constants::Meter;

use super::Keywords;

/// OI_WAVELENGTH table: the spectral channels of one instrument setup, named by INSNAME.
#[derive(Debug, Clone, PartialEq)]
pub struct OIWavelength {
    ins_name: String,
    /// EFF_WAVE column, one value per channel
    pub eff_wave: Vec<f32>,
    /// EFF_BAND column, one value per channel
    pub eff_band: Vec<f32>,
    pub keywords: Keywords,
}

impl OIWavelength {
    pub fn new(ins_name: impl Into<String>, eff_wave: Vec<f32>, eff_band: Vec<f32>) -> Self {
        OIWavelength {
            ins_name: ins_name.into(),
            eff_wave,
            eff_band,
            keywords: Keywords::new(),
        }
    }

    pub fn ins_name(&self) -> &str {
        &self.ins_name
    }

    pub fn set_ins_name(&mut self, ins_name: impl Into<String>) {
        self.ins_name = ins_name.into();
    }

    /// Number of spectral channels.
    pub fn nwave(&self) -> usize {
        self.eff_wave.len()
    }

    /// Shortest and longest effective wavelength, `None` for an empty table.
    pub fn wavelength_range(&self) -> Option<(Meter, Meter)> {
        self.eff_wave.iter().fold(None, |range, &w| {
            let w = w as Meter;
            match range {
                None => Some((w, w)),
                Some((min, max)) => Some((min.min(w), max.max(w))),
            }
        })
    }
}
