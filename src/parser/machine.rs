//! Per-phase line matcher.
//!
//! A [`PhaseMachine`] borrows the run accumulator for one phase and is fed
//! lines one at a time. Marker checks are ordered and the first match wins.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::line::{self, RawEvent};
use super::markers::{
    BACK_TO_TOWN, BODY_KILL_STATES, BODY_VULNERABLE, BOSS_FOUND, BUGGED_SHIELD_GAP_SECS,
    ENCOUNTER_START, HOST_MIGRATION, LEG_KILL, MISSION_END, NICKNAME, PYLONS_LAUNCHED,
    SHIELD_SWITCH, SQUAD_MEMBER, STATE_CHANGE, ZONE_EXIT, is_shield_phase_ending, phase_end,
};
use super::run::{AbsoluteRun, LegEvent, Phase, ShieldEvent};

/// Game-state transition that interrupted an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// A new encounter started before the current one finished.
    NewEncounter,
    /// The player left for town.
    ReturnedToTown,
    /// The mission ended (abandoned or failed).
    MissionEnded,
    /// Hosting moved to another player.
    HostMigration,
}

impl AbortReason {
    /// Whether the next read has to look for an encounter-start marker.
    ///
    /// A new encounter already consumed its own start marker.
    #[must_use]
    pub const fn requires_start(self) -> bool {
        !matches!(self, Self::NewEncounter)
    }

    /// Whether the partial run is worth reporting as a broken run.
    #[must_use]
    pub const fn keeps_partial(self) -> bool {
        matches!(self, Self::ReturnedToTown | Self::MissionEnded)
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NewEncounter => "a new Profit-Taker encounter was started",
            Self::ReturnedToTown => "the player returned to town",
            Self::MissionEnded => "the mission ended",
            Self::HostMigration => "a host migration happened",
        })
    }
}

/// Result of feeding one line to a [`PhaseMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep feeding lines.
    Continue,
    /// The phase is over.
    Ended,
    /// The attempt was interrupted.
    Aborted(AbortReason),
}

/// Line matcher for one phase of one attempt.
#[derive(Debug)]
pub struct PhaseMachine<'r> {
    run: &'r mut AbsoluteRun,
    phase: Phase,
    /// Body-vulnerable messages seen in this phase.
    kill_sequence: u8,
    /// Phase-3 shields counted while checking for the cycling bug.
    shield_count: u32,
    last_shield_time: f64,
}

impl<'r> PhaseMachine<'r> {
    pub const fn new(run: &'r mut AbsoluteRun, phase: Phase) -> Self {
        Self {
            run,
            phase,
            kill_sequence: 0,
            shield_count: 0,
            last_shield_time: 0.0,
        }
    }

    /// Consumes one line.
    pub fn feed(&mut self, text: &str) -> Step {
        let event = RawEvent::parse(text);
        if let Some(event) = &event {
            if let Some(step) = self.fight_event(event) {
                self.run.final_time = Some(event.time);
                return step;
            }
        } else {
            trace!(line = text, "line without timestamp");
        }
        self.other_event(text, event.map(|e| e.time))
    }

    /// Fight markers. `None` when the line is not one.
    fn fight_event(&mut self, event: &RawEvent<'_>) -> Option<Step> {
        let text = event.text;
        let time = event.time;

        if text.contains(SHIELD_SWITCH) {
            return Some(self.shield_switch(event));
        }
        if is_shield_phase_ending(text) {
            self.run.phase_mut(self.phase).shield_end = Some(time);
        } else if text.contains(LEG_KILL) {
            let slot = line::leg_slot(text);
            self.run
                .phase_mut(self.phase)
                .legs
                .push(LegEvent { slot, time });
        } else if text.contains(BODY_VULNERABLE) {
            return Some(self.body_vulnerable(time));
        } else if text.contains(STATE_CHANGE) {
            match line::state_code(text) {
                Some(code) if BODY_KILL_STATES.contains(&code) => {
                    self.run.phase_mut(self.phase).body_killed = Some(time);
                }
                Some(_) => {}
                None => debug!(line = text, "unparsable state change"),
            }
        } else if text.contains(PYLONS_LAUNCHED) {
            self.run.phase_mut(self.phase).pylon_start = Some(time);
        } else if text.contains(BOSS_FOUND) {
            self.run.boss_found = Some(time);
        } else if phase_end(self.phase).is_some_and(|cue| text.contains(cue)) {
            if self.phase.has_pylons() {
                self.run.phase_mut(self.phase).pylon_end = Some(time);
            }
            return Some(Step::Ended);
        } else {
            return None;
        }
        Some(Step::Continue)
    }

    fn shield_switch(&mut self, event: &RawEvent<'_>) -> Step {
        let shield = ShieldEvent {
            element: line::shield_element(event),
            time: event.time,
        };
        let phase3 = self.run.phase(Phase::Three);
        let in_pylons = self.phase == Phase::Three && phase3.pylon_start.is_some();
        let watch_for_bug = in_pylons && self.kill_sequence == 2 && phase3.shield_end.is_some();

        if in_pylons {
            self.run.pylon_shields.push(shield);
        } else {
            self.run.phase_mut(self.phase).shields.push(shield);
        }

        if watch_for_bug {
            if event.time - self.last_shield_time < BUGGED_SHIELD_GAP_SECS && self.shield_count > 0 {
                debug!(
                    run = self.run.run_number,
                    time = event.time,
                    gap = event.time - self.last_shield_time,
                    "shield cycling during pylons, run is bugged"
                );
                self.run.bugged = true;
                return Step::Ended;
            }
            self.shield_count += 1;
        }
        self.last_shield_time = event.time;
        Step::Continue
    }

    fn body_vulnerable(&mut self, time: f64) -> Step {
        let record = self.run.phase_mut(self.phase);
        if self.kill_sequence == 0 {
            record.body_vulnerable = Some(time);
        }
        self.kill_sequence += 1;
        if self.kill_sequence == 3 || (self.phase == Phase::Four && self.run.bugged) {
            self.run.phase_mut(self.phase).body_killed = Some(time);
            return Step::Ended;
        }
        Step::Continue
    }

    /// Markers outside the fight itself.
    fn other_event(&mut self, text: &str, time: Option<f64>) -> Step {
        if text.contains(NICKNAME) {
            if let Some(name) = line::nickname(text) {
                self.run.nickname = name;
            }
        } else if text.contains(SQUAD_MEMBER) {
            if let Some(member) = line::squad_member(text) {
                self.run.squad_members.insert(member);
            }
        } else if text.contains(ZONE_EXIT) {
            if self.run.heist_start.is_none() {
                self.run.heist_start = time;
            }
        } else if text.contains(ENCOUNTER_START) {
            return Step::Aborted(AbortReason::NewEncounter);
        } else if text.contains(BACK_TO_TOWN) {
            return Step::Aborted(AbortReason::ReturnedToTown);
        } else if text.contains(MISSION_END) {
            return Step::Aborted(AbortReason::MissionEnded);
        } else if text.contains(HOST_MIGRATION) {
            return Step::Aborted(AbortReason::HostMigration);
        }
        Step::Continue
    }
}
