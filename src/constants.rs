//! # Constants and type definitions for oimerge
//!
//! This module centralizes the **reserved sentinel values**, **OIFITS keyword names**, and
//! **common type aliases** used throughout the merge engine.
//!
//! ## Overview
//!
//! - Sentinels used to mark unmappable identifiers and references
//! - FITS keyword / extension names used by the OIFITS model
//! - Core type aliases shared by the model and the processing modules
//! - Angular conversion factors used by the target matcher

// -------------------------------------------------------------------------------------------------
// Sentinels
// -------------------------------------------------------------------------------------------------

/// Reserved target identifier meaning "no valid mapping".
///
/// Valid OI_TARGET identifiers are strictly positive, so this value can never collide with
/// an identifier assigned by the merge.
pub const UNDEFINED_SHORT: TargetId = i16::MIN;

/// Reserved lookup-table name used when an ARRNAME reference cannot be mapped.
pub const UNDEFINED: &str = "UNDEFINED";

// -------------------------------------------------------------------------------------------------
// OIFITS keywords
// -------------------------------------------------------------------------------------------------

/// Value of the primary header CONTENT keyword for OIFITS version 2 files.
pub const KEYWORD_CONTENT_OIFITS2: &str = "OIFITS2";

pub const OI_TARGET: &str = "OI_TARGET";
pub const OI_WAVELENGTH: &str = "OI_WAVELENGTH";
pub const OI_ARRAY: &str = "OI_ARRAY";
pub const OI_CORR: &str = "OI_CORR";

// -------------------------------------------------------------------------------------------------
// Angles
// -------------------------------------------------------------------------------------------------

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → degrees
pub const ARCSEC_TO_DEG: f64 = 1.0 / 3600.0;

/// Default tolerance used to decide that two target records denote the same source.
pub const DEFAULT_TARGET_TOLERANCE_ARCSEC: f64 = 1.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Local target identifier (TARGET_ID column, 16-bit signed integer in FITS)
pub type TargetId = i16;
/// Station index (STA_INDEX column)
pub type StaIndex = i16;
/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Wavelength in meters
pub type Meter = f64;
