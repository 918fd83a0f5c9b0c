use serde::Serialize;

/// Distance between a current rate and the rate it should be at today.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateGap {
    pub current_rate: f64,
    pub target_rate: f64,
    /// `target - current`; negative once the target is exceeded.
    pub gap: f64,
    pub absolute_gap: f64,
    /// Absolute gap as a percentage of the current rate.
    pub gap_percent: f64,
    pub target_met: bool,
}

pub fn rate_gap(current_rate: f64, target_rate: f64) -> RateGap {
    let gap = target_rate - current_rate;
    let gap_percent = if current_rate == 0.0 {
        0.0
    } else {
        (gap / current_rate * 100.0).abs()
    };
    RateGap {
        current_rate,
        target_rate,
        gap,
        absolute_gap: gap.abs(),
        gap_percent,
        target_met: current_rate >= target_rate,
    }
}
