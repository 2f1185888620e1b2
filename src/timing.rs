//! Relative timing breakdown of a validated run.
//!
//! Durations are measured by walking the phases in order with a single
//! cursor that starts when the boss is found. Every sub-stage duration is
//! the distance from the cursor to the event that closes it, so the parts
//! of a well-ordered fight add up to (at most) the fight duration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::parser::validate;
use crate::parser::{AbsoluteRun, LegSlot, Phase, ShieldElement};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldTiming {
    pub element: ShieldElement,
    /// `None` when the duration cannot be known.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegTiming {
    pub slot: LegSlot,
    pub duration: f64,
}

/// Relative breakdown of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    /// Time from the heist start to the end of this phase.
    pub elapsed: f64,
    pub shields: Vec<ShieldTiming>,
    pub legs: Vec<LegTiming>,
    pub body: f64,
    pub pylon: Option<f64>,
}

impl PhaseTiming {
    #[must_use]
    pub fn shield_sum(&self) -> f64 {
        self.shields.iter().filter_map(|s| s.duration).sum()
    }

    #[must_use]
    pub fn leg_sum(&self) -> f64 {
        self.legs.iter().map(|l| l.duration).sum()
    }
}

/// Completed run with relative durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeRun {
    pub run_number: u32,
    pub nickname: String,
    pub squad_members: BTreeSet<String>,
    pub bugged: bool,
    /// Heist start to boss found.
    pub flight: f64,
    pub phases: Vec<PhaseTiming>,
    /// Shields swapped during the phase-3 pylons, for information only.
    pub pylon_shields: Vec<ShieldTiming>,
    /// Heist start to the last recorded event.
    pub total_duration: f64,
    /// Fastest run of the whole log (finite mode).
    pub best_run: bool,
    /// Fastest run of the session at the time it finished.
    pub best_run_yet: bool,
    pub anomalies: Vec<String>,
}

impl RelativeRun {
    /// Duration the run is ranked by.
    ///
    /// Bugged runs lack a reliable phase-4 end, so the raw total is used.
    #[must_use]
    pub fn length(&self) -> f64 {
        if self.bugged {
            return self.total_duration;
        }
        self.phase(Phase::Four).map_or(self.total_duration, |p| p.elapsed)
    }

    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseTiming> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    #[must_use]
    pub fn shield_sum(&self) -> f64 {
        self.phases.iter().map(PhaseTiming::shield_sum).sum()
    }

    #[must_use]
    pub fn leg_sum(&self) -> f64 {
        self.phases.iter().map(PhaseTiming::leg_sum).sum()
    }

    #[must_use]
    pub fn body_sum(&self) -> f64 {
        self.phases.iter().map(|p| p.body).sum()
    }

    #[must_use]
    pub fn pylon_sum(&self) -> f64 {
        self.phases.iter().filter_map(|p| p.pylon).sum()
    }

    /// Sum of the individual parts; leaves out animations and waits.
    #[must_use]
    pub fn sum_of_parts(&self) -> f64 {
        self.shield_sum() + self.leg_sum() + self.body_sum() + self.pylon_sum()
    }
}

/// Minimal report for an attempt that was abandoned mid-fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokenRunSummary {
    pub run_number: u32,
    pub nickname: String,
    pub squad_members: BTreeSet<String>,
    /// Estimated time from the heist start to the last recorded event.
    pub total_time: f64,
}

impl From<&AbsoluteRun> for BrokenRunSummary {
    fn from(run: &AbsoluteRun) -> Self {
        Self {
            run_number: run.run_number,
            nickname: run.nickname.clone(),
            squad_members: run.squad_members.clone(),
            total_time: run.elapsed(),
        }
    }
}

/// Converts a validated run into relative durations.
///
/// Missing timestamps fall back to the cursor, so this never fails; a run
/// that passed validation never hits those fallbacks.
#[must_use]
pub fn to_relative(run: &AbsoluteRun) -> RelativeRun {
    let heist_start = run.heist_start.unwrap_or(0.0);
    let boss_found = run.boss_found.unwrap_or(heist_start);
    let mut cursor = boss_found;
    let mut phases = Vec::with_capacity(Phase::ALL.len());

    for phase in Phase::ALL {
        let record = run.phase(phase);
        let mut shields = Vec::with_capacity(record.shields.len());

        if phase.has_shields() && !record.shields.is_empty() {
            for (i, pair) in record.shields.windows(2).enumerate() {
                let duration = if run.bugged && phase == Phase::Four && i == 0 {
                    0.0
                } else {
                    non_negative(pair[1].time - cursor)
                };
                shields.push(ShieldTiming {
                    element: pair[0].element,
                    duration: Some(duration),
                });
                cursor = pair[1].time;
            }
            // The armor sub-stage starts when the last shield drops.
            let shield_end = record
                .shield_end
                .or_else(|| record.legs.first().map(|l| l.time))
                .unwrap_or(cursor);
            if let Some(last) = record.shields.last() {
                shields.push(ShieldTiming {
                    element: last.element,
                    duration: Some(non_negative(shield_end - cursor)),
                });
            }
            cursor = shield_end;
        }

        let legs = record
            .legs
            .iter()
            .map(|leg| {
                let duration = non_negative(leg.time - cursor);
                cursor = leg.time;
                LegTiming {
                    slot: leg.slot,
                    duration,
                }
            })
            .collect();

        let killed = record.body_killed.unwrap_or(cursor);
        let body = non_negative(killed - record.body_vulnerable.unwrap_or(killed));
        cursor = killed;

        let mut pylon = None;
        if phase.has_pylons() && !(run.bugged && phase == Phase::Three) {
            if let (Some(start), Some(end)) = (record.pylon_start, record.pylon_end) {
                pylon = Some(non_negative(end - start));
                cursor = end;
            }
        }

        phases.push(PhaseTiming {
            phase,
            elapsed: non_negative(cursor - heist_start),
            shields,
            legs,
            body,
            pylon,
        });
    }

    RelativeRun {
        run_number: run.run_number,
        nickname: run.nickname.clone(),
        squad_members: run.squad_members.clone(),
        bugged: run.bugged,
        flight: non_negative(boss_found - heist_start),
        phases,
        pylon_shields: run
            .pylon_shields
            .iter()
            .map(|s| ShieldTiming {
                element: s.element,
                duration: None,
            })
            .collect(),
        total_duration: run.elapsed(),
        best_run: false,
        best_run_yet: false,
        anomalies: validate::anomalies(run),
    }
}

fn non_negative(duration: f64) -> f64 {
    duration.max(0.0)
}
