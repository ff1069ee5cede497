//! Configuration matrix
//!
//! One point per transport client type and scenario. Each point is an
//! independent comparison sequence against a fresh reference run.

use std::fmt;

use parity_core::TransportClientType;
use serde::{Deserialize, Serialize};

/// Comparison sequence to run at a matrix point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Reference, then standard offload, then remote-spill offload
    Standard,
    /// Remote-merge offload, then reference
    RemoteMerge,
}

impl Scenario {
    /// Both scenarios in execution order
    pub fn all() -> [Scenario; 2] {
        [Scenario::Standard, Scenario::RemoteMerge]
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Standard => f.write_str("standard"),
            Scenario::RemoteMerge => f.write_str("remote-merge"),
        }
    }
}

/// A single cell of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixPoint {
    /// Transport used by the offload runs
    pub client_type: TransportClientType,
    /// Which comparison sequence to run
    pub scenario: Scenario,
}

impl MatrixPoint {
    /// Build a point
    pub fn new(client_type: TransportClientType, scenario: Scenario) -> Self {
        MatrixPoint {
            client_type,
            scenario,
        }
    }
}

impl fmt::Display for MatrixPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.client_type, self.scenario)
    }
}

/// Ordered set of matrix points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationMatrix {
    points: Vec<MatrixPoint>,
}

impl ConfigurationMatrix {
    /// Every client type crossed with every scenario
    pub fn full() -> Self {
        let points = TransportClientType::all()
            .into_iter()
            .flat_map(|client| {
                Scenario::all()
                    .into_iter()
                    .map(move |scenario| MatrixPoint::new(client, scenario))
            })
            .collect();
        ConfigurationMatrix { points }
    }

    /// Only the given client type, both scenarios
    pub fn for_client(client_type: TransportClientType) -> Self {
        ConfigurationMatrix {
            points: Scenario::all()
                .into_iter()
                .map(|scenario| MatrixPoint::new(client_type, scenario))
                .collect(),
        }
    }

    /// Points in execution order
    pub fn points(&self) -> &[MatrixPoint] {
        &self.points
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the matrix has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<MatrixPoint> for ConfigurationMatrix {
    fn from_iter<I: IntoIterator<Item = MatrixPoint>>(iter: I) -> Self {
        ConfigurationMatrix {
            points: iter.into_iter().collect(),
        }
    }
}
