//! Measurement planes and the per-rewrite rotation tables.
//!
//! A measured node's basis lies in one of three Pauli planes. Each graph
//! rewrite rotates planes according to a fixed table; every table is
//! an involution, which is what makes the rewrites self-inverse.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The Pauli plane a measurement basis lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plane {
    XY,
    XZ,
    YZ,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::XY, Plane::XZ, Plane::YZ];

    /// Rotation applied to the local-complementation target: XY <-> XZ.
    pub fn local_complement_target(self) -> Plane {
        match self {
            Plane::XY => Plane::XZ,
            Plane::XZ => Plane::XY,
            Plane::YZ => Plane::YZ,
        }
    }

    /// Rotation applied to every other measured node under local
    /// complementation: XZ <-> YZ.
    pub fn local_complement_other(self) -> Plane {
        match self {
            Plane::XY => Plane::XY,
            Plane::XZ => Plane::YZ,
            Plane::YZ => Plane::XZ,
        }
    }

    /// Rotation applied to both pivot nodes: XY <-> YZ.
    pub fn pivot(self) -> Plane {
        match self {
            Plane::XY => Plane::YZ,
            Plane::XZ => Plane::XZ,
            Plane::YZ => Plane::XY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plane::XY => "XY",
            Plane::XZ => "XZ",
            Plane::YZ => "YZ",
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plane {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "XY" => Ok(Plane::XY),
            "XZ" => Ok(Plane::XZ),
            "YZ" => Ok(Plane::YZ),
            _ => Err(CoreError::InvalidPlane {
                value: s.to_string(),
            }),
        }
    }
}

/// Measurement basis of a non-output node. `angle` is in units of pi.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub plane: Plane,
    pub angle: f64,
}

impl Measurement {
    pub fn new(plane: Plane, angle: f64) -> Self {
        Measurement { plane, angle }
    }
}
