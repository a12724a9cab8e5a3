//! Aircraft variants supported by the installer.
//!
//! Every livery batch targets exactly one [`AircraftVariant`]. The variant
//! decides which community package receives the liveries, which SimObjects
//! base folder the `base_container` reference points at, and which aircraft
//! package the livery pack declares as its dependency.
//!
//! # Example
//!
//! ```
//! use liveryinstaller::variant::AircraftVariant;
//!
//! let variant: AircraftVariant = "737-800bbj2".parse().unwrap();
//! assert_eq!(variant.code(), "737-800BBJ2");
//! assert_eq!(variant.base_name(), "PMDG 737-800BBJ2");
//! assert_eq!(variant.package_folder(), "pmdg-aircraft-738-liveries");
//! assert_eq!(variant.dependency(), "pmdg-aircraft-738");
//! ```

use std::fmt;
use std::str::FromStr;

/// Engine codes that may follow the base name in a `base_container` value.
pub const ENGINE_CODES: [&str; 3] = ["GE", "RR", "PW"];

/// A PMDG aircraft sub-model with its own package identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum AircraftVariant {
    B777_200ER,
    B777_300ER,
    B777F,
    B737_600,
    B737_700,
    B737_700BBJ,
    B737_700BDSF,
    B737_800,
    B737_800BBJ2,
    B737_800BCF,
    B737_800BDSF,
    B737_900,
    B737_900ER,
}

impl AircraftVariant {
    /// Every supported variant, in display order.
    pub const ALL: [AircraftVariant; 13] = [
        Self::B777_200ER,
        Self::B777_300ER,
        Self::B777F,
        Self::B737_600,
        Self::B737_700,
        Self::B737_700BBJ,
        Self::B737_700BDSF,
        Self::B737_800,
        Self::B737_800BBJ2,
        Self::B737_800BCF,
        Self::B737_800BDSF,
        Self::B737_900,
        Self::B737_900ER,
    ];

    /// The operator-facing variant code, e.g. `777-300ER`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::B777_200ER => "777-200ER",
            Self::B777_300ER => "777-300ER",
            Self::B777F => "777F",
            Self::B737_600 => "737-600",
            Self::B737_700 => "737-700",
            Self::B737_700BBJ => "737-700BBJ",
            Self::B737_700BDSF => "737-700BDSF",
            Self::B737_800 => "737-800",
            Self::B737_800BBJ2 => "737-800BBJ2",
            Self::B737_800BCF => "737-800BCF",
            Self::B737_800BDSF => "737-800BDSF",
            Self::B737_900 => "737-900",
            Self::B737_900ER => "737-900ER",
        }
    }

    /// Short airframe key shared by the package and dependency names.
    fn airframe(&self) -> &'static str {
        match self {
            Self::B777_200ER => "77er",
            Self::B777_300ER => "77w",
            Self::B777F => "77f",
            Self::B737_600 => "736",
            Self::B737_700 | Self::B737_700BBJ | Self::B737_700BDSF => "737",
            Self::B737_800 | Self::B737_800BBJ2 | Self::B737_800BCF | Self::B737_800BDSF => {
                "738"
            }
            Self::B737_900 | Self::B737_900ER => "739",
        }
    }

    /// SimObjects base folder name, also used inside `base_container`.
    pub fn base_name(&self) -> String {
        format!("PMDG {}", self.code())
    }

    /// Community package folder that collects liveries for this variant.
    pub fn package_folder(&self) -> String {
        format!("pmdg-aircraft-{}-liveries", self.airframe())
    }

    /// Aircraft package the livery pack depends on.
    ///
    /// This is also the folder name of the aircraft's host-managed state
    /// package.
    pub fn dependency(&self) -> String {
        format!("pmdg-aircraft-{}", self.airframe())
    }

    /// Whether the variant ships with selectable engine types.
    pub fn has_engine_options(&self) -> bool {
        matches!(self, Self::B777_200ER)
    }

    /// Dependency names of all supported aircraft, without duplicates.
    pub fn dependencies() -> Vec<String> {
        let mut deps: Vec<String> = Self::ALL.iter().map(|v| v.dependency()).collect();
        deps.dedup();
        deps
    }
}

impl fmt::Display for AircraftVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a variant code is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown aircraft variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for AircraftVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let wanted = wanted
            .strip_prefix("PMDG ")
            .or_else(|| wanted.strip_prefix("pmdg "))
            .unwrap_or(wanted);
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}
