use nalgebra::Vector3;

use crate::constants::StaIndex;

use super::Keywords;

/// One telescope station of an OI_ARRAY table.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub tel_name: String,
    pub sta_name: String,
    pub sta_index: StaIndex,
    /// Element diameter in meters
    pub diameter: f32,
    /// Station coordinates relative to the array center, in meters
    pub sta_xyz: Vector3<f64>,
}

impl Station {
    pub fn new(
        tel_name: impl Into<String>,
        sta_name: impl Into<String>,
        sta_index: StaIndex,
        diameter: f32,
        sta_xyz: Vector3<f64>,
    ) -> Self {
        Station {
            tel_name: tel_name.into(),
            sta_name: sta_name.into(),
            sta_index,
            diameter,
            sta_xyz,
        }
    }
}

/// OI_ARRAY table: the station geometry of one interferometer, named by ARRNAME.
#[derive(Debug, Clone, PartialEq)]
pub struct OIArray {
    arr_name: String,
    /// Coordinate frame of ARRAYX/Y/Z (usually "GEOCENTRIC")
    pub frame: String,
    /// Array center in meters (ARRAYX, ARRAYY, ARRAYZ keywords)
    pub array_xyz: Vector3<f64>,
    pub stations: Vec<Station>,
    pub keywords: Keywords,
}

impl OIArray {
    pub fn new(
        arr_name: impl Into<String>,
        array_xyz: Vector3<f64>,
        stations: Vec<Station>,
    ) -> Self {
        OIArray {
            arr_name: arr_name.into(),
            frame: "GEOCENTRIC".into(),
            array_xyz,
            stations,
            keywords: Keywords::new(),
        }
    }

    pub fn arr_name(&self) -> &str {
        &self.arr_name
    }

    pub fn set_arr_name(&mut self, arr_name: impl Into<String>) {
        self.arr_name = arr_name.into();
    }

    pub fn station(&self, sta_index: StaIndex) -> Option<&Station> {
        self.stations.iter().find(|s| s.sta_index == sta_index)
    }
}
