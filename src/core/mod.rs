mod dashboard;
mod engine;
mod gap;
mod series;
mod types;

pub use dashboard::{
    DashboardInputs, DashboardReport, DashboardSettings, RoomTypeReport, RoomTypeSettings,
    available_target_years, build_dashboard,
};
pub use engine::{
    INFLATION_RECOVERY_MULTIPLIER, inflation_adjusted_baseline, project_with_approved_rates,
    project_with_custom_fallback,
};
pub use gap::{RateGap, rate_gap};
pub use series::{ChartPoint, DEFAULT_CHART_WINDOW, chart_series};
pub use types::{
    AppliedRate, ApprovedRateEntry, ApprovedRateTable, CurrentRates, FiscalYear,
    HistoricalRecord, ProjectionInput, ProjectionResult, RateSchedule, RoomType, ScheduleError,
    YearSequence, YearStep,
};
