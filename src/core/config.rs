//! Engine configuration
//!
//! Two billing decisions are policy rather than arithmetic: how a partial
//! late hour is counted, and which rates a return is billed with. Both are
//! selected here and passed to the lifecycle controller.

use clap::ValueEnum;

/// How a partial hour of late return is counted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LateHourRounding {
    /// Any started hour is charged in full
    #[default]
    Ceil,

    /// Only completed hours are charged
    Floor,
}

/// Which rate schedule a return is billed with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RatePolicy {
    /// Rates captured on the rental when it started
    #[default]
    Snapshot,

    /// The vehicle's rates at the time of return
    Live,
}

/// Policies applied by the lifecycle controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub late_rounding: LateHourRounding,
    pub rate_policy: RatePolicy,
}

impl EngineConfig {
    pub fn new(late_rounding: LateHourRounding, rate_policy: RatePolicy) -> Self {
        Self {
            late_rounding,
            rate_policy,
        }
    }
}
