use super::types::{
    AppliedRate, FiscalYear, ProjectionInput, ProjectionResult, RateSchedule, YearStep,
};

/// Cumulative CPI growth since the baseline year. A projected rate at or above
/// `baseline * INFLATION_RECOVERY_MULTIPLIER` counts as fully recovered.
pub const INFLATION_RECOVERY_MULTIPLIER: f64 = 1.415;

/// What to apply to a year that has no approved increase.
#[derive(Copy, Clone, Debug)]
enum UnapprovedYear {
    HoldFlat,
    Custom(f64),
}

/// Compounds `current_rate` through the schedule using approved increases only.
///
/// A target year outside the sequence, or not after the start year, yields the
/// single-step identity projection. Years in the sequence without an approved
/// increase hold the rate flat.
pub fn project_with_approved_rates(
    schedule: &RateSchedule,
    current_rate: f64,
    baseline_rate: f64,
    target_year: &FiscalYear,
) -> ProjectionResult {
    project(
        schedule,
        current_rate,
        baseline_rate,
        target_year,
        UnapprovedYear::HoldFlat,
    )
}

/// Like [`project_with_approved_rates`], but years without an approved increase
/// compound at `custom_annual_rate_percent`. Approved increases always win.
pub fn project_with_custom_fallback(
    schedule: &RateSchedule,
    input: &ProjectionInput,
) -> ProjectionResult {
    project(
        schedule,
        input.current_rate,
        input.baseline_rate,
        &input.target_year,
        UnapprovedYear::Custom(input.custom_annual_rate_percent),
    )
}

pub fn inflation_adjusted_baseline(baseline_rate: f64) -> f64 {
    baseline_rate * INFLATION_RECOVERY_MULTIPLIER
}

fn project(
    schedule: &RateSchedule,
    current_rate: f64,
    baseline_rate: f64,
    target_year: &FiscalYear,
    unapproved: UnapprovedYear,
) -> ProjectionResult {
    let years = &schedule.years;
    let start_year = years.start_year();
    let start_step = YearStep::new(start_year.clone(), current_rate, AppliedRate::Starting);

    let target_index = match years.position(target_year) {
        Some(idx) if idx > 0 => idx,
        _ => return build_result(current_rate, baseline_rate, vec![start_step]),
    };

    let mut rate = current_rate;
    let mut breakdown = Vec::with_capacity(target_index + 1);
    breakdown.push(start_step);

    for year in &years.years()[1..=target_index] {
        let applied = match (schedule.approved.get(year), unapproved) {
            (Some(percent), _) => AppliedRate::Approved(percent),
            (None, UnapprovedYear::Custom(percent)) => AppliedRate::Custom(percent),
            (None, UnapprovedYear::HoldFlat) => AppliedRate::Unapproved,
        };
        if let Some(percent) = applied.percent() {
            rate = compound(rate, percent);
        }
        breakdown.push(YearStep::new(year.clone(), rate, applied));
    }

    build_result(rate, baseline_rate, breakdown)
}

fn compound(rate: f64, annual_percent: f64) -> f64 {
    rate * (1.0 + annual_percent / 100.0)
}

fn build_result(projected_rate: f64, baseline_rate: f64, breakdown: Vec<YearStep>) -> ProjectionResult {
    let inflation_adjusted_baseline = inflation_adjusted_baseline(baseline_rate);
    ProjectionResult {
        projected_rate,
        inflation_adjusted_baseline,
        fully_recovered: projected_rate >= inflation_adjusted_baseline,
        still_to_recover: (inflation_adjusted_baseline - projected_rate).max(0.0),
        breakdown,
    }
}
