//! Steel Profile Tables (EN 10365)
//!
//! Section properties of the hot-rolled profiles used for cerchiature:
//! HEA, HEB, IPE and UPN. Units follow the European tables:
//!
//! - `h`, `b`, `tw`, `tf`: mm
//! - `A`: cm²
//! - `Ix`, `Iy`: cm⁴
//! - `Wx`, `Wy`: cm³
//! - `ix`, `iy`: cm
//!
//! ## Example
//!
//! ```rust
//! use cerchiatura_core::reinforcement::profiles::{self, ProfileFamily};
//!
//! let hea = profiles::lookup("HEA 160").unwrap();
//! assert_eq!(hea.ix, 1673.0);
//!
//! let rotated = hea.rotated();
//! assert_eq!(rotated.ix, 616.0);
//!
//! let best = profiles::optimal(300.0, 0.0, Some(&[ProfileFamily::Ipe])).unwrap();
//! assert_eq!(best.designation(), "IPE 240");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{CalcError, CalcResult};

/// Profile family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProfileFamily {
    #[serde(rename = "HEA")]
    Hea,
    #[serde(rename = "HEB")]
    Heb,
    #[serde(rename = "IPE")]
    Ipe,
    #[serde(rename = "UPN", alias = "UNP")]
    Upn,
}

impl ProfileFamily {
    pub const ALL: [ProfileFamily; 4] = [ProfileFamily::Hea, ProfileFamily::Heb, ProfileFamily::Ipe, ProfileFamily::Upn];

    pub fn code(&self) -> &'static str {
        match self {
            ProfileFamily::Hea => "HEA",
            ProfileFamily::Heb => "HEB",
            ProfileFamily::Ipe => "IPE",
            ProfileFamily::Upn => "UPN",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "HEA" | "HE-A" => Some(ProfileFamily::Hea),
            "HEB" | "HE-B" => Some(ProfileFamily::Heb),
            "IPE" => Some(ProfileFamily::Ipe),
            "UPN" | "UNP" => Some(ProfileFamily::Upn),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProfileFamily::Hea => "Wide flange, light (HEA)",
            ProfileFamily::Heb => "Wide flange, medium (HEB)",
            ProfileFamily::Ipe => "I-beam (IPE)",
            ProfileFamily::Upn => "Channel (UPN)",
        }
    }
}

impl std::fmt::Display for ProfileFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A hot-rolled steel profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteelProfile {
    pub family: ProfileFamily,
    /// Nominal size (the number in "HEA 160")
    pub size: u32,

    /// Depth (mm)
    pub h: f64,
    /// Flange width (mm)
    pub b: f64,
    /// Web thickness (mm)
    pub tw: f64,
    /// Flange thickness (mm)
    pub tf: f64,

    /// Area (cm²)
    #[serde(rename = "A")]
    pub a: f64,
    /// Strong-axis moment of inertia (cm⁴)
    #[serde(rename = "Ix")]
    pub ix: f64,
    /// Weak-axis moment of inertia (cm⁴)
    #[serde(rename = "Iy")]
    pub iy: f64,
    /// Strong-axis elastic modulus (cm³)
    #[serde(rename = "Wx")]
    pub wx: f64,
    /// Weak-axis elastic modulus (cm³)
    #[serde(rename = "Wy")]
    pub wy: f64,
    /// Radii of gyration (cm)
    #[serde(rename = "ix")]
    pub rx: f64,
    #[serde(rename = "iy")]
    pub ry: f64,
}

impl SteelProfile {
    pub fn designation(&self) -> String {
        format!("{} {}", self.family.code(), self.size)
    }

    /// Same profile turned by 90°: x and y properties swap.
    pub fn rotated(&self) -> SteelProfile {
        SteelProfile {
            ix: self.iy,
            iy: self.ix,
            wx: self.wy,
            wy: self.wx,
            rx: self.ry,
            ry: self.rx,
            ..self.clone()
        }
    }

    /// `n` identical profiles acting together: A, I and W scale by `n`.
    pub fn combined(&self, n: f64) -> SteelProfile {
        SteelProfile {
            a: self.a * n,
            ix: self.ix * n,
            iy: self.iy * n,
            wx: self.wx * n,
            wy: self.wy * n,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for SteelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (A={:.1} cm², Ix={:.0} cm⁴, Wx={:.1} cm³)",
            self.designation(),
            self.a,
            self.ix,
            self.wx
        )
    }
}

static DESIGNATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z-]*)\s*(\d+)\s*$").expect("designation pattern is valid")
});

/// Split a designation like "HEA 160" or "hea160" into family and size.
pub fn parse_designation(designation: &str) -> CalcResult<(ProfileFamily, u32)> {
    let caps = DESIGNATION_RE
        .captures(designation)
        .ok_or_else(|| CalcError::parse_error("profile designation", designation))?;

    let family = ProfileFamily::from_code(&caps[1]).ok_or_else(|| CalcError::profile_not_found(designation))?;
    let size = caps[2]
        .parse::<u32>()
        .map_err(|_| CalcError::parse_error("profile size", designation))?;
    Ok((family, size))
}

/// In-memory profile table indexed by family and size.
#[derive(Debug, Clone, Default)]
pub struct ProfileDb {
    profiles: HashMap<(ProfileFamily, u32), SteelProfile>,
}

impl ProfileDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, profile: SteelProfile) {
        self.profiles.insert((profile.family, profile.size), profile);
    }

    /// Look up a profile by designation; spacing and case are ignored.
    pub fn lookup(&self, designation: &str) -> CalcResult<&SteelProfile> {
        let key = parse_designation(designation)?;
        self.profiles
            .get(&key)
            .ok_or_else(|| CalcError::profile_not_found(designation))
    }

    /// Families present in the table
    pub fn available_types(&self) -> Vec<ProfileFamily> {
        let mut families: Vec<ProfileFamily> = ProfileFamily::ALL
            .iter()
            .copied()
            .filter(|f| self.profiles.keys().any(|(family, _)| family == f))
            .collect();
        families.sort();
        families
    }

    /// Sizes of one family, sorted numerically
    pub fn available_sizes(&self, family: ProfileFamily) -> Vec<u32> {
        let mut sizes: Vec<u32> = self
            .profiles
            .keys()
            .filter(|(f, _)| *f == family)
            .map(|(_, size)| *size)
            .collect();
        sizes.sort_unstable();
        sizes
    }

    /// Profiles with `Wx ≥ min_wx` and `Ix ≥ min_ix`, sorted by increasing `Wx`.
    pub fn search(&self, min_wx: f64, min_ix: f64, families: Option<&[ProfileFamily]>) -> Vec<&SteelProfile> {
        let mut found: Vec<&SteelProfile> = self
            .profiles
            .values()
            .filter(|p| families.map_or(true, |fs| fs.contains(&p.family)))
            .filter(|p| p.wx >= min_wx && p.ix >= min_ix)
            .collect();
        found.sort_by(|a, b| a.wx.total_cmp(&b.wx).then(a.family.cmp(&b.family)));
        found
    }

    /// Lightest profile (by `Wx`) meeting both requirements
    pub fn optimal(&self, required_wx: f64, required_ix: f64, families: Option<&[ProfileFamily]>) -> Option<&SteelProfile> {
        self.search(required_wx, required_ix, families).into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// ============================================================================
// Built-in tables
// ============================================================================

type Row = (u32, f64, f64, f64, f64, f64, f64, f64, f64, f64, f64, f64);

// size, h, b, tw, tf, A, Ix, Iy, Wx, Wy, ix, iy
const HEA: &[Row] = &[
    (100, 96.0, 100.0, 5.0, 8.0, 21.2, 349.0, 134.0, 72.8, 26.8, 4.06, 2.51),
    (120, 114.0, 120.0, 5.0, 8.0, 25.3, 606.0, 231.0, 106.3, 38.5, 4.89, 3.02),
    (140, 133.0, 140.0, 5.5, 8.5, 31.4, 1033.0, 389.0, 155.4, 55.6, 5.73, 3.52),
    (160, 152.0, 160.0, 6.0, 9.0, 38.8, 1673.0, 616.0, 220.1, 77.0, 6.57, 3.98),
    (180, 171.0, 180.0, 6.0, 9.5, 45.3, 2510.0, 925.0, 293.6, 102.7, 7.45, 4.52),
    (200, 190.0, 200.0, 6.5, 10.0, 53.8, 3692.0, 1336.0, 388.6, 133.6, 8.28, 4.98),
    (220, 210.0, 220.0, 7.0, 11.0, 64.3, 5410.0, 1955.0, 515.2, 177.7, 9.17, 5.51),
    (240, 230.0, 240.0, 7.5, 12.0, 76.8, 7763.0, 2769.0, 675.1, 230.7, 10.05, 6.00),
    (260, 250.0, 260.0, 7.5, 12.5, 86.8, 10450.0, 3668.0, 836.4, 282.1, 10.97, 6.50),
    (280, 270.0, 280.0, 8.0, 13.0, 97.3, 13670.0, 4763.0, 1013.0, 340.2, 11.86, 7.00),
    (300, 290.0, 300.0, 8.5, 14.0, 112.5, 18260.0, 6310.0, 1260.0, 420.6, 12.74, 7.49),
    (320, 310.0, 300.0, 9.0, 15.5, 124.4, 22930.0, 6985.0, 1479.0, 465.7, 13.58, 7.49),
    (340, 330.0, 300.0, 9.5, 16.5, 133.5, 27690.0, 7436.0, 1678.0, 495.7, 14.40, 7.46),
    (360, 350.0, 300.0, 10.0, 17.5, 142.8, 33090.0, 7887.0, 1891.0, 525.8, 15.22, 7.43),
    (400, 390.0, 300.0, 11.0, 19.0, 159.0, 45070.0, 8564.0, 2311.0, 570.9, 16.84, 7.34),
    (450, 440.0, 300.0, 11.5, 21.0, 178.0, 63720.0, 9465.0, 2896.0, 631.0, 18.92, 7.29),
    (500, 490.0, 300.0, 12.0, 23.0, 197.5, 86970.0, 10370.0, 3550.0, 691.1, 20.98, 7.24),
];

const HEB: &[Row] = &[
    (100, 100.0, 100.0, 6.0, 10.0, 26.0, 450.0, 167.0, 89.9, 33.5, 4.16, 2.53),
    (120, 120.0, 120.0, 6.5, 11.0, 34.0, 864.0, 318.0, 144.1, 52.9, 5.04, 3.06),
    (140, 140.0, 140.0, 7.0, 12.0, 43.0, 1509.0, 550.0, 215.6, 78.5, 5.93, 3.58),
    (160, 160.0, 160.0, 8.0, 13.0, 54.3, 2492.0, 889.0, 311.5, 111.2, 6.78, 4.05),
    (180, 180.0, 180.0, 8.5, 14.0, 65.3, 3831.0, 1363.0, 425.7, 151.4, 7.66, 4.57),
    (200, 200.0, 200.0, 9.0, 15.0, 78.1, 5696.0, 2003.0, 569.6, 200.3, 8.54, 5.07),
    (220, 220.0, 220.0, 9.5, 16.0, 91.0, 8091.0, 2843.0, 735.5, 258.5, 9.43, 5.59),
    (240, 240.0, 240.0, 10.0, 17.0, 106.0, 11260.0, 3923.0, 938.3, 326.9, 10.31, 6.08),
    (260, 260.0, 260.0, 10.0, 17.5, 118.4, 14920.0, 5135.0, 1148.0, 395.0, 11.22, 6.58),
    (280, 280.0, 280.0, 10.5, 18.0, 131.4, 19270.0, 6595.0, 1376.0, 471.1, 12.11, 7.09),
    (300, 300.0, 300.0, 11.0, 19.0, 149.1, 25170.0, 8563.0, 1678.0, 570.9, 13.00, 7.58),
    (320, 320.0, 300.0, 11.5, 20.5, 161.3, 30820.0, 9239.0, 1926.0, 615.9, 13.82, 7.57),
    (340, 340.0, 300.0, 12.0, 21.5, 170.9, 36660.0, 9690.0, 2156.0, 646.0, 14.65, 7.53),
    (360, 360.0, 300.0, 12.5, 22.5, 180.6, 43190.0, 10140.0, 2400.0, 676.1, 15.46, 7.49),
    (400, 400.0, 300.0, 13.5, 24.0, 197.8, 57680.0, 10820.0, 2884.0, 721.3, 17.08, 7.40),
    (450, 450.0, 300.0, 14.0, 26.0, 218.0, 79890.0, 11720.0, 3551.0, 781.4, 19.14, 7.33),
    (500, 500.0, 300.0, 14.5, 28.0, 238.6, 107200.0, 12620.0, 4287.0, 841.6, 21.19, 7.27),
];

const IPE: &[Row] = &[
    (80, 80.0, 46.0, 3.8, 5.2, 7.64, 80.1, 8.49, 20.0, 3.69, 3.24, 1.05),
    (100, 100.0, 55.0, 4.1, 5.7, 10.3, 171.0, 15.9, 34.2, 5.79, 4.07, 1.24),
    (120, 120.0, 64.0, 4.4, 6.3, 13.2, 318.0, 27.7, 53.0, 8.65, 4.90, 1.45),
    (140, 140.0, 73.0, 4.7, 6.9, 16.4, 541.0, 44.9, 77.3, 12.3, 5.74, 1.65),
    (160, 160.0, 82.0, 5.0, 7.4, 20.1, 869.0, 68.3, 108.7, 16.7, 6.58, 1.84),
    (180, 180.0, 91.0, 5.3, 8.0, 23.9, 1317.0, 101.0, 146.3, 22.2, 7.42, 2.05),
    (200, 200.0, 100.0, 5.6, 8.5, 28.5, 1943.0, 142.0, 194.3, 28.5, 8.26, 2.24),
    (220, 220.0, 110.0, 5.9, 9.2, 33.4, 2772.0, 205.0, 252.0, 37.3, 9.11, 2.48),
    (240, 240.0, 120.0, 6.2, 9.8, 39.1, 3892.0, 284.0, 324.3, 47.3, 9.97, 2.69),
    (270, 270.0, 135.0, 6.6, 10.2, 45.9, 5790.0, 420.0, 429.0, 62.2, 11.23, 3.02),
    (300, 300.0, 150.0, 7.1, 10.7, 53.8, 8356.0, 604.0, 557.1, 80.5, 12.46, 3.35),
    (330, 330.0, 160.0, 7.5, 11.5, 62.6, 11770.0, 788.0, 713.1, 98.5, 13.71, 3.55),
    (360, 360.0, 170.0, 8.0, 12.7, 72.7, 16270.0, 1043.0, 903.6, 122.8, 14.95, 3.79),
    (400, 400.0, 180.0, 8.6, 13.5, 84.5, 23130.0, 1318.0, 1156.0, 146.4, 16.55, 3.95),
    (450, 450.0, 190.0, 9.4, 14.6, 98.8, 33740.0, 1676.0, 1500.0, 176.4, 18.48, 4.12),
    (500, 500.0, 200.0, 10.2, 16.0, 116.0, 48200.0, 2142.0, 1928.0, 214.2, 20.43, 4.31),
    (550, 550.0, 210.0, 11.1, 17.2, 134.4, 67120.0, 2668.0, 2441.0, 254.1, 22.35, 4.45),
    (600, 600.0, 220.0, 12.0, 19.0, 156.0, 92080.0, 3387.0, 3069.0, 307.9, 24.30, 4.66),
];

const UPN: &[Row] = &[
    (80, 80.0, 45.0, 6.0, 8.0, 11.0, 106.0, 19.4, 26.5, 6.36, 3.10, 1.33),
    (100, 100.0, 50.0, 6.0, 8.5, 13.5, 206.0, 29.3, 41.2, 8.49, 3.91, 1.47),
    (120, 120.0, 55.0, 7.0, 9.0, 17.0, 364.0, 43.2, 60.7, 11.1, 4.62, 1.59),
    (140, 140.0, 60.0, 7.0, 10.0, 20.4, 605.0, 62.7, 86.4, 14.8, 5.45, 1.75),
    (160, 160.0, 65.0, 7.5, 10.5, 24.0, 925.0, 85.3, 116.0, 18.3, 6.21, 1.89),
    (180, 180.0, 70.0, 8.0, 11.0, 28.0, 1350.0, 114.0, 150.0, 22.4, 6.95, 2.02),
    (200, 200.0, 75.0, 8.5, 11.5, 32.2, 1910.0, 148.0, 191.0, 27.0, 7.70, 2.14),
    (220, 220.0, 80.0, 9.0, 12.5, 37.4, 2690.0, 197.0, 245.0, 33.6, 8.48, 2.30),
    (240, 240.0, 85.0, 9.5, 13.0, 42.3, 3600.0, 248.0, 300.0, 39.6, 9.22, 2.42),
    (260, 260.0, 90.0, 10.0, 14.0, 48.3, 4820.0, 317.0, 371.0, 47.7, 9.99, 2.56),
    (280, 280.0, 95.0, 10.0, 15.0, 53.3, 6280.0, 399.0, 448.0, 57.2, 10.85, 2.74),
    (300, 300.0, 100.0, 10.0, 16.0, 58.8, 8030.0, 495.0, 535.0, 67.8, 11.69, 2.90),
];

/// Database with every built-in EN 10365 profile
pub fn builtin_profiles() -> ProfileDb {
    let mut db = ProfileDb::new();
    for (family, rows) in [
        (ProfileFamily::Hea, HEA),
        (ProfileFamily::Heb, HEB),
        (ProfileFamily::Ipe, IPE),
        (ProfileFamily::Upn, UPN),
    ] {
        for &(size, h, b, tw, tf, a, ix, iy, wx, wy, rx, ry) in rows {
            db.insert(SteelProfile {
                family,
                size,
                h,
                b,
                tw,
                tf,
                a,
                ix,
                iy,
                wx,
                wy,
                rx,
                ry,
            });
        }
    }
    db
}

/// Shared read-only profile table
pub static PROFILES: Lazy<ProfileDb> = Lazy::new(builtin_profiles);

pub fn lookup(designation: &str) -> CalcResult<&'static SteelProfile> {
    PROFILES.lookup(designation)
}

pub fn available_types() -> Vec<ProfileFamily> {
    PROFILES.available_types()
}

pub fn available_sizes(family: ProfileFamily) -> Vec<u32> {
    PROFILES.available_sizes(family)
}

pub fn search(min_wx: f64, min_ix: f64, families: Option<&[ProfileFamily]>) -> Vec<&'static SteelProfile> {
    PROFILES.search(min_wx, min_ix, families)
}

pub fn optimal(required_wx: f64, required_ix: f64, families: Option<&[ProfileFamily]>) -> Option<&'static SteelProfile> {
    PROFILES.optimal(required_wx, required_ix, families)
}
