use serde::Serialize;

use super::types::{ApprovedRateTable, FiscalYear, HistoricalRecord};

/// Number of trailing historical years plotted by default.
pub const DEFAULT_CHART_WINDOW: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub year: FiscalYear,
    pub room_single: f64,
    pub room_double: f64,
    pub bor_rate: Option<f64>,
}

/// Last `window` historical rows, rounded to whole dollars, annotated with the
/// approved increase for that year when one exists.
pub fn chart_series(
    historical: &[HistoricalRecord],
    approved: &ApprovedRateTable,
    window: usize,
) -> Vec<ChartPoint> {
    let skip = historical.len().saturating_sub(window);
    historical[skip..]
        .iter()
        .map(|record| ChartPoint {
            year: record.year.clone(),
            room_single: record.single.round(),
            room_double: record.double.round(),
            bor_rate: approved.get(&record.year),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RateSchedule;

    fn record(year: u16, single: f64, double: f64) -> HistoricalRecord {
        HistoricalRecord {
            year: FiscalYear::from_short(year),
            single,
            double,
            actual_cpi: 0.0,
        }
    }

    #[test]
    fn keeps_trailing_window_and_rounds_rates() {
        let rows: Vec<HistoricalRecord> = (11..=30)
            .map(|year| record(year, 4000.0 + f64::from(year) + 0.5, 3000.4))
            .collect();
        let schedule = RateSchedule::default();

        let points = chart_series(&rows, &schedule.approved, DEFAULT_CHART_WINDOW);
        assert_eq!(points.len(), 8);
        assert_eq!(points[0].year.as_str(), "FY23");
        assert_eq!(points[7].year.as_str(), "FY30");
        assert_eq!(points[0].room_single, 4024.0);
        assert_eq!(points[0].room_double, 3000.0);
        assert_eq!(points[2].bor_rate, Some(5.5));
        assert_eq!(points[6].bor_rate, Some(9.0));
        assert_eq!(points[7].bor_rate, None);
    }

    #[test]
    fn short_history_is_returned_whole() {
        let rows = vec![record(24, 5156.03, 4109.33)];
        let points = chart_series(&rows, &ApprovedRateTable::default(), DEFAULT_CHART_WINDOW);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].room_single, 5156.0);
        assert!(chart_series(&[], &ApprovedRateTable::default(), 8).is_empty());
    }
}
