//! Speed and zone data.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::format::{self, POSITION_DECIMALS};

/// TCP speeds (mm/s) the controller predefines as `v<speed>`.
pub const PREDEFINED_TCP_SPEEDS: [u32; 25] = [
    5, 10, 20, 30, 40, 50, 60, 80, 100, 150, 200, 300, 400, 500, 600, 800, 1000, 1500, 2000, 2500,
    3000, 4000, 5000, 6000, 7000,
];

const fn default_v_ori() -> f64 {
    500.0
}
const fn default_v_leax() -> f64 {
    5000.0
}
const fn default_v_reax() -> f64 {
    1000.0
}

/// Motion speed: TCP (mm/s), reorientation (deg/s), linear external axes
/// (mm/s) and rotational external axes (deg/s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedData {
    pub name: String,
    pub v_tcp: f64,
    #[serde(default = "default_v_ori")]
    pub v_ori: f64,
    #[serde(default = "default_v_leax")]
    pub v_leax: f64,
    #[serde(default = "default_v_reax")]
    pub v_reax: f64,
}

impl SpeedData {
    /// A custom speed with the controller's default reorientation and
    /// external axis speeds.
    pub fn new(name: impl Into<String>, v_tcp: f64) -> Self {
        Self {
            name: name.into(),
            v_tcp,
            v_ori: default_v_ori(),
            v_leax: default_v_leax(),
            v_reax: default_v_reax(),
        }
    }

    /// The predefined `v<v_tcp>` record, if the controller has one.
    pub fn predefined(v_tcp: u32) -> Option<Self> {
        PREDEFINED_TCP_SPEEDS
            .contains(&v_tcp)
            .then(|| Self::new(format!("v{v_tcp}"), f64::from(v_tcp)))
    }

    pub fn with_reorientation(mut self, v_ori: f64) -> Self {
        self.v_ori = v_ori;
        self
    }

    pub fn with_external_axes(mut self, v_leax: f64, v_reax: f64) -> Self {
        self.v_leax = v_leax;
        self.v_reax = v_reax;
        self
    }

    /// Whether this is one of the controller's built-in records, which must
    /// not be declared again.
    pub fn is_predefined(&self) -> bool {
        let builtin = PREDEFINED_TCP_SPEEDS
            .iter()
            .any(|v| self.name == format!("v{v}") && self.v_tcp == f64::from(*v));
        builtin
            && self.v_ori == default_v_ori()
            && self.v_leax == default_v_leax()
            && self.v_reax == default_v_reax()
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        if self.name.is_empty() {
            return Err(ActionError::EmptyName { what: "Speed data" });
        }
        if !format::is_identifier(&self.name) {
            return Err(ActionError::InvalidIdentifier(self.name.clone()));
        }
        for (what, value) in [
            ("TCP speed", self.v_tcp),
            ("Reorientation speed", self.v_ori),
            ("Linear external axis speed", self.v_leax),
            ("Rotational external axis speed", self.v_reax),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ActionError::OutOfRange { what, value });
            }
        }
        Ok(())
    }

    /// `VAR speeddata` line.
    pub fn declaration(&self) -> String {
        format!(
            "\tVAR speeddata {}:=[{}];",
            self.name,
            format::number_list(
                &[self.v_tcp, self.v_ori, self.v_leax, self.v_reax],
                POSITION_DECIMALS
            )
        )
    }
}

impl Default for SpeedData {
    /// `v5`, the slowest predefined speed.
    fn default() -> Self {
        Self::new("v5", 5.0)
    }
}

/// How closely a move must reach its end point before the next one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneData {
    /// Exact stop.
    Fine,
    /// Corner zone `z<n>`.
    Zone(u32),
}

impl ZoneData {
    /// Negative precision means exact stop, anything else the zone of that
    /// size.
    pub fn from_precision(precision: i32) -> Self {
        u32::try_from(precision).map_or(Self::Fine, Self::Zone)
    }
}

impl fmt::Display for ZoneData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fine => f.write_str("fine"),
            Self::Zone(n) => write!(f, "z{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
