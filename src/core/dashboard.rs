use serde::Serialize;

use super::engine::{project_with_approved_rates, project_with_custom_fallback};
use super::gap::{RateGap, rate_gap};
use super::types::{
    FiscalYear, HistoricalRecord, ProjectionInput, ProjectionResult, RateSchedule, RoomType,
};

/// Reference values per room type: the baseline-year rate used for recovery and the
/// rate each room type should be at today.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomTypeSettings {
    pub baseline_rate: f64,
    pub target_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub single: RoomTypeSettings,
    pub double: RoomTypeSettings,
    pub board: RoomTypeSettings,
    /// Board rates are not part of the remote dataset; this seeds the board input.
    pub default_board_rate: f64,
    pub default_custom_annual_rate_percent: f64,
    pub default_target_year: FiscalYear,
}

impl DashboardSettings {
    pub fn room(&self, room_type: RoomType) -> RoomTypeSettings {
        match room_type {
            RoomType::Single => self.single,
            RoomType::Double => self.double,
            RoomType::Board => self.board,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            single: RoomTypeSettings {
                baseline_rate: 3748.55,
                target_rate: 5305.56,
            },
            double: RoomTypeSettings {
                baseline_rate: 2987.57,
                target_rate: 4228.50,
            },
            board: RoomTypeSettings {
                baseline_rate: 2500.0,
                target_rate: 4200.0,
            },
            default_board_rate: 3500.0,
            default_custom_annual_rate_percent: 5.0,
            default_target_year: FiscalYear::new("FY30"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardInputs {
    pub single_rate: f64,
    pub double_rate: f64,
    pub board_rate: f64,
    pub custom_annual_rate_percent: f64,
    pub target_year: FiscalYear,
}

impl DashboardInputs {
    pub fn rate_for(&self, room_type: RoomType) -> f64 {
        match room_type {
            RoomType::Single => self.single_rate,
            RoomType::Double => self.double_rate,
            RoomType::Board => self.board_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeReport {
    pub room_type: RoomType,
    pub baseline_rate: f64,
    pub gap: RateGap,
    pub approved_projection: ProjectionResult,
    pub custom_projection: ProjectionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub target_year: FiscalYear,
    pub custom_annual_rate_percent: f64,
    /// Approved increase for the target year itself, when the board has set one.
    pub target_year_approved_rate: Option<f64>,
    pub rooms: Vec<RoomTypeReport>,
}

pub fn build_dashboard(
    settings: &DashboardSettings,
    schedule: &RateSchedule,
    inputs: &DashboardInputs,
) -> DashboardReport {
    let rooms = RoomType::ALL
        .into_iter()
        .map(|room_type| {
            let room = settings.room(room_type);
            let current_rate = inputs.rate_for(room_type);
            let projection_input = ProjectionInput {
                current_rate,
                baseline_rate: room.baseline_rate,
                custom_annual_rate_percent: inputs.custom_annual_rate_percent,
                target_year: inputs.target_year.clone(),
            };
            RoomTypeReport {
                room_type,
                baseline_rate: room.baseline_rate,
                gap: rate_gap(current_rate, room.target_rate),
                approved_projection: project_with_approved_rates(
                    schedule,
                    current_rate,
                    room.baseline_rate,
                    &inputs.target_year,
                ),
                custom_projection: project_with_custom_fallback(schedule, &projection_input),
            }
        })
        .collect();

    DashboardReport {
        target_year: inputs.target_year.clone(),
        custom_annual_rate_percent: inputs.custom_annual_rate_percent,
        target_year_approved_rate: schedule.approved.get(&inputs.target_year),
        rooms,
    }
}

/// Years offered as projection targets: the historical years from the schedule's start
/// year onward, or the schedule itself when the history does not reach the start year.
pub fn available_target_years(
    historical: &[HistoricalRecord],
    schedule: &RateSchedule,
) -> Vec<FiscalYear> {
    let start = schedule.years.start_year();
    match historical.iter().position(|record| &record.year == start) {
        Some(idx) => historical[idx..]
            .iter()
            .map(|record| record.year.clone())
            .collect(),
        None => schedule.years.years().to_vec(),
    }
}
