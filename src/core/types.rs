use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fiscal year label such as `FY25`.
///
/// Years have no intrinsic ordering; compare them through their position in a
/// [`YearSequence`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FiscalYear(String);

impl FiscalYear {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_ascii_uppercase())
    }

    /// `FY` followed by the two-digit year, e.g. `FiscalYear::from_short(25)` is `FY25`.
    pub fn from_short(year: u16) -> Self {
        Self(format!("FY{:02}", year % 100))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FiscalYear {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for FiscalYear {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<FiscalYear> for String {
    fn from(value: FiscalYear) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("fiscal year sequence must contain at least one year")]
    EmptySequence,
    #[error("fiscal year {0} appears more than once in the sequence")]
    DuplicateYear(FiscalYear),
    #[error("approved rate for {year} must be a finite percentage, got {percent}")]
    InvalidApprovedRate { year: FiscalYear, percent: f64 },
}

/// Ordered fiscal years the projector walks. The first entry is the start year.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct YearSequence(Vec<FiscalYear>);

impl YearSequence {
    pub fn new(years: Vec<FiscalYear>) -> Result<Self, ScheduleError> {
        if years.is_empty() {
            return Err(ScheduleError::EmptySequence);
        }
        for (idx, year) in years.iter().enumerate() {
            if years[..idx].contains(year) {
                return Err(ScheduleError::DuplicateYear(year.clone()));
            }
        }
        Ok(Self(years))
    }

    /// Consecutive years `FY{first}..=FY{last}`.
    pub fn fiscal_range(first: u16, last: u16) -> Result<Self, ScheduleError> {
        Self::new((first..=last).map(FiscalYear::from_short).collect())
    }

    pub fn start_year(&self) -> &FiscalYear {
        &self.0[0]
    }

    pub fn position(&self, year: &FiscalYear) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == year)
    }

    pub fn years(&self) -> &[FiscalYear] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for YearSequence {
    fn default() -> Self {
        Self((25..=30).map(FiscalYear::from_short).collect())
    }
}

/// Board-approved annual increase percentages keyed by fiscal year.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApprovedRateTable(HashMap<FiscalYear, f64>);

impl ApprovedRateTable {
    pub fn new<I, Y>(entries: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = (Y, f64)>,
        Y: Into<FiscalYear>,
    {
        let mut rates = HashMap::new();
        for (year, percent) in entries {
            let year = year.into();
            if !percent.is_finite() {
                return Err(ScheduleError::InvalidApprovedRate { year, percent });
            }
            rates.insert(year, percent);
        }
        Ok(Self(rates))
    }

    pub fn get(&self, year: &FiscalYear) -> Option<f64> {
        self.0.get(year).copied()
    }

    pub fn contains(&self, year: &FiscalYear) -> bool {
        self.0.contains_key(year)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries listed in sequence order; years outside the sequence are omitted.
    pub fn in_sequence_order(&self, years: &YearSequence) -> Vec<ApprovedRateEntry> {
        years
            .years()
            .iter()
            .filter_map(|year| {
                self.get(year).map(|percent| ApprovedRateEntry {
                    year: year.clone(),
                    percent,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedRateEntry {
    pub year: FiscalYear,
    pub percent: f64,
}

/// The fiscal-year horizon together with the approved increases that cover part of it.
#[derive(Clone, Debug, PartialEq)]
pub struct RateSchedule {
    pub years: YearSequence,
    pub approved: ApprovedRateTable,
}

impl RateSchedule {
    pub fn new(years: YearSequence, approved: ApprovedRateTable) -> Self {
        Self { years, approved }
    }
}

impl Default for RateSchedule {
    fn default() -> Self {
        let approved = ApprovedRateTable(
            [
                ("FY25", 5.5),
                ("FY26", 5.0),
                ("FY27", 4.5),
                ("FY28", 6.0),
                ("FY29", 9.0),
            ]
            .into_iter()
            .map(|(year, percent)| (FiscalYear::new(year), percent))
            .collect(),
        );
        Self {
            years: YearSequence::default(),
            approved,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub current_rate: f64,
    pub baseline_rate: f64,
    pub custom_annual_rate_percent: f64,
    pub target_year: FiscalYear,
}

/// Which percentage produced a breakdown step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AppliedRate {
    Starting,
    Approved(f64),
    Custom(f64),
    Unapproved,
}

impl AppliedRate {
    pub fn percent(self) -> Option<f64> {
        match self {
            AppliedRate::Approved(p) | AppliedRate::Custom(p) => Some(p),
            AppliedRate::Starting | AppliedRate::Unapproved => None,
        }
    }
}

impl fmt::Display for AppliedRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedRate::Starting => f.write_str("Starting Rate"),
            AppliedRate::Approved(p) => write!(f, "{p}% (BOR)"),
            AppliedRate::Custom(p) => write!(f, "{p}% (Custom)"),
            AppliedRate::Unapproved => f.write_str("No Approved Rate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearStep {
    pub year: FiscalYear,
    pub rate: f64,
    pub applied_rate_label: String,
    pub applied_percent: Option<f64>,
}

impl YearStep {
    pub(crate) fn new(year: FiscalYear, rate: f64, applied: AppliedRate) -> Self {
        Self {
            year,
            rate,
            applied_rate_label: applied.to_string(),
            applied_percent: applied.percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub projected_rate: f64,
    pub inflation_adjusted_baseline: f64,
    pub fully_recovered: bool,
    pub still_to_recover: f64,
    pub breakdown: Vec<YearStep>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Board,
}

impl RoomType {
    pub const ALL: [RoomType; 3] = [RoomType::Single, RoomType::Double, RoomType::Board];
}

/// One row of the historical rate table supplied by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRecord {
    pub year: FiscalYear,
    #[serde(default, deserialize_with = "sheet_number")]
    pub single: f64,
    #[serde(default, deserialize_with = "sheet_number")]
    pub double: f64,
    #[serde(default, rename = "actualCPI", deserialize_with = "sheet_number")]
    pub actual_cpi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentRates {
    #[serde(default, deserialize_with = "sheet_number")]
    pub single: f64,
    #[serde(default, deserialize_with = "sheet_number")]
    pub double: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SheetCell {
    Number(f64),
    Text(String),
}

/// Spreadsheet cells arrive as numbers, numeric text, blanks or `null`. Blanks count as 0.
fn sheet_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<SheetCell>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(SheetCell::Number(value)) => Ok(value),
        Some(SheetCell::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(0.0);
            }
            text.parse::<f64>().map_err(|_| {
                serde::de::Error::custom(format!("expected a number, got '{text}'"))
            })
        }
    }
}
