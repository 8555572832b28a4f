//! Element sets shared by the unit tests.

pub const ISS_LINE1: &str =
    "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
pub const ISS_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";
pub const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

pub const SSO_LINE1: &str =
    "1 63211U 25052B   25237.20035185  .00004580  00000+0  21963-3 0  9990";
pub const SSO_LINE2: &str =
    "2 63211  97.4291 130.4139 0011580 251.3726 108.6212 15.18234919 27742";

/// Semi-major axis below the Earth's radius at epoch.
pub const DECAYED_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 17.20000000563531";
pub const ZERO_MOTION_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 00.00000000563531";
pub const OTHER_CATALOG_LINE2: &str =
    "2 25545  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563538";
