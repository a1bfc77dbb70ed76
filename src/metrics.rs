//! Performance instrumentation for tree operations and joins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Running totals over repeated operations of one kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    /// Number of recorded operations
    pub measurements: u64,
    /// Page loads across all operations
    pub disk_accesses: u64,
    /// Geometry comparisons across all operations
    pub verifications: u64,
    /// Wall time across all operations
    pub total_time: Duration,
}

impl PerformanceStats {
    pub fn record(&mut self, disk_accesses: u64, verifications: u64, elapsed: Duration) {
        self.measurements += 1;
        self.disk_accesses += disk_accesses;
        self.verifications += verifications;
        self.total_time += elapsed;
    }

    pub fn average_disk_accesses(&self) -> f64 {
        self.average(self.disk_accesses as f64)
    }

    pub fn average_verifications(&self) -> f64 {
        self.average(self.verifications as f64)
    }

    pub fn average_time(&self) -> Duration {
        match self.measurements {
            0 => Duration::ZERO,
            n => self.total_time / n as u32,
        }
    }

    fn average(&self, total: f64) -> f64 {
        match self.measurements {
            0 => 0.0,
            n => total / n as f64,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Join algorithm variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinStrategy {
    /// Cross product of entries per node pair
    #[default]
    Basic,
    /// Entries filtered to the parents' common region first
    RestrictedSpace,
    /// Restricted entries matched by a sweep along the first axis
    PlaneSweep,
    /// Plane sweep with matches batched by their most shared entry
    PlaneSweepPinning,
    /// Pinning with matches processed in Z-order
    ZOrder,
}

impl JoinStrategy {
    pub const ALL: [JoinStrategy; 5] = [
        Self::Basic,
        Self::RestrictedSpace,
        Self::PlaneSweep,
        Self::PlaneSweepPinning,
        Self::ZOrder,
    ];
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::RestrictedSpace => "restricted-space",
            Self::PlaneSweep => "plane-sweep",
            Self::PlaneSweepPinning => "plane-sweep-pinning",
            Self::ZOrder => "z-order",
        };
        f.write_str(name)
    }
}

/// Counters for one join call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMetrics {
    pub strategy: JoinStrategy,
    /// Rectangle overlap tests performed
    pub comparisons: u64,
    /// Page cache misses
    pub disk_accesses: u64,
    pub elapsed: Duration,
    /// Number of emitted pairs
    pub results: usize,
}
