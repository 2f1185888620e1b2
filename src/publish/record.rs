//! JSON run records consumed by the companion app.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

use super::ParserStatus;
use crate::parser::Phase;
use crate::timing::{BrokenRunSummary, PhaseTiming, RelativeRun};

/// Format of the stem of record file names.
pub const FILE_STEM_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Per-phase section of a [`RunRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseSection {
    pub phase_time: f64,
    pub total_shield: f64,
    pub total_leg: f64,
    pub shield_change_times: Vec<Option<f64>>,
    pub shield_change_types: Vec<String>,
    pub leg_break_times: Vec<f64>,
    pub leg_break_order: Vec<String>,
    pub body_kill_time: f64,
    pub pylon_time: Option<f64>,
}

impl From<&PhaseTiming> for PhaseSection {
    fn from(timing: &PhaseTiming) -> Self {
        Self {
            phase_time: timing.elapsed,
            total_shield: timing.shield_sum(),
            total_leg: timing.leg_sum(),
            shield_change_times: timing.shields.iter().map(|s| s.duration).collect(),
            shield_change_types: timing
                .shields
                .iter()
                .map(|s| s.element.name().to_owned())
                .collect(),
            leg_break_times: timing.legs.iter().map(|l| l.duration).collect(),
            leg_break_order: timing
                .legs
                .iter()
                .map(|l| l.slot.abbreviation().to_owned())
                .collect(),
            body_kill_time: timing.body,
            pylon_time: timing.pylon,
        }
    }
}

/// Flat record of one run, completed or broken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub total_duration: f64,
    pub total_shield: f64,
    pub total_leg: f64,
    pub total_body: f64,
    pub total_pylon: f64,
    pub flight_duration: f64,
    pub bugged_run: bool,
    pub aborted_run: bool,
    pub best_run: bool,
    pub time_stamp: String,
    pub squad_members: Vec<String>,
    pub nickname: String,
    pub file_name: String,
    pub pretty_name: String,
    pub status: ParserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_1: Option<PhaseSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_2: Option<PhaseSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_3: Option<PhaseSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_4: Option<PhaseSection>,
}

impl RunRecord {
    /// Record for a completed run that started at `started_at`.
    #[must_use]
    pub fn completed(run: &RelativeRun, started_at: NaiveDateTime) -> Self {
        let section = |phase| run.phase(phase).map(PhaseSection::from);
        Self {
            total_duration: run.length(),
            total_shield: run.shield_sum(),
            total_leg: run.leg_sum(),
            total_body: run.body_sum(),
            total_pylon: run.pylon_sum(),
            flight_duration: run.flight,
            bugged_run: run.bugged,
            aborted_run: false,
            best_run: run.best_run_yet,
            time_stamp: now_stamp(),
            squad_members: run.squad_members.iter().cloned().collect(),
            nickname: run.nickname.clone(),
            file_name: file_stem(started_at),
            pretty_name: String::new(),
            status: ParserStatus::RunPublished,
            phase_1: section(Phase::One),
            phase_2: section(Phase::Two),
            phase_3: section(Phase::Three),
            phase_4: section(Phase::Four),
        }
    }

    /// Record for an attempt abandoned mid-fight.
    #[must_use]
    pub fn broken(summary: &BrokenRunSummary, started_at: NaiveDateTime) -> Self {
        Self {
            total_duration: summary.total_time,
            total_shield: 0.0,
            total_leg: 0.0,
            total_body: 0.0,
            total_pylon: 0.0,
            flight_duration: 0.0,
            bugged_run: false,
            aborted_run: true,
            best_run: false,
            time_stamp: now_stamp(),
            squad_members: summary.squad_members.iter().cloned().collect(),
            nickname: summary.nickname.clone(),
            file_name: file_stem(started_at),
            pretty_name: String::new(),
            status: ParserStatus::RunPublished,
            phase_1: None,
            phase_2: None,
            phase_3: None,
            phase_4: None,
        }
    }

    /// Renders the record on top of `template`.
    ///
    /// Template keys the record does not set survive; record fields win.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the record cannot be encoded.
    pub fn render(&self, template: &Value) -> Result<Value, serde_json::Error> {
        let mut merged = template.clone();
        deep_merge(&mut merged, &serde_json::to_value(self)?);
        Ok(merged)
    }
}

/// Template with only `status` overridden, served before any run exists.
#[must_use]
pub fn status_only(template: &Value, status: ParserStatus) -> Value {
    let mut merged = template.clone();
    let mut overlay = Map::new();
    overlay.insert("status".to_owned(), Value::from(status.as_str()));
    deep_merge(&mut merged, &Value::Object(overlay));
    merged
}

#[must_use]
pub fn file_stem(started_at: NaiveDateTime) -> String {
    started_at.format(FILE_STEM_FORMAT).to_string()
}

fn now_stamp() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Deep merges `overlay` into `base`.
///
/// For objects: recursively merge keys. For other types: overlay replaces
/// base.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(key) {
                    deep_merge(base_value, overlay_value);
                } else {
                    base_map.insert(key.clone(), overlay_value.clone());
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}
