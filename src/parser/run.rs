//! Absolute-time accumulator for a single attempt.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::element::ShieldElement;

/// One of the four sequential stages of the fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    One,
    Two,
    Three,
    Four,
}

impl Phase {
    /// All phases in fight order.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// 1-based phase number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Phases 1, 3 and 4 open with a shield sub-stage.
    #[must_use]
    pub const fn has_shields(self) -> bool {
        !matches!(self, Self::Two)
    }

    /// Phases 1 and 3 close with a pylon sub-stage.
    #[must_use]
    pub const fn has_pylons(self) -> bool {
        matches!(self, Self::One | Self::Three)
    }

    const fn index(self) -> usize {
        self.number() as usize - 1
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Leg position, from the perspective of the player facing the boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegSlot {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
    Unknown,
}

impl LegSlot {
    /// Two-letter abbreviation used in reports and records.
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::FrontLeft => "FL",
            Self::FrontRight => "FR",
            Self::BackLeft => "BL",
            Self::BackRight => "BR",
            Self::Unknown => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldEvent {
    pub element: ShieldElement,
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegEvent {
    pub slot: LegSlot,
    pub time: f64,
}

/// Absolute timestamps collected for one phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub shields: Vec<ShieldEvent>,
    pub shield_end: Option<f64>,
    pub legs: Vec<LegEvent>,
    pub body_vulnerable: Option<f64>,
    pub body_killed: Option<f64>,
    pub pylon_start: Option<f64>,
    pub pylon_end: Option<f64>,
}

/// Accumulator for one attempt, in absolute log time.
///
/// Owned by the run reader until the attempt terminates; handed out whole
/// on success and as a partial on abort or bug.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteRun {
    pub run_number: u32,
    pub nickname: String,
    pub squad_members: BTreeSet<String>,
    /// First zone exit; the reference point for all relative timing.
    pub heist_start: Option<f64>,
    pub boss_found: Option<f64>,
    pub phases: [PhaseRecord; 4],
    /// Shield switches seen while the phase-3 pylons were up (the "3.5" bucket).
    pub pylon_shields: Vec<ShieldEvent>,
    pub final_time: Option<f64>,
    pub bugged: bool,
}

impl AbsoluteRun {
    #[must_use]
    pub fn new(run_number: u32) -> Self {
        Self {
            run_number,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn phase(&self, phase: Phase) -> &PhaseRecord {
        &self.phases[phase.index()]
    }

    pub const fn phase_mut(&mut self, phase: Phase) -> &mut PhaseRecord {
        &mut self.phases[phase.index()]
    }

    /// Moves the shield that was active when the phase-3 pylons went down
    /// to the front of phase 4, then drops the trailing phase-4 switch that
    /// fires as the boss dies.
    ///
    /// Returns `false` when a clean run ends up with no phase-4 shields.
    pub fn reassign_pylon_shields(&mut self) -> bool {
        if let Some(carried) = self.pylon_shields.pop() {
            self.phase_mut(Phase::Four).shields.insert(0, carried);
        }
        if self.bugged {
            return true;
        }
        self.phase_mut(Phase::Four).shields.pop().is_some()
    }

    /// Elapsed time between the heist start and the last recorded event,
    /// floored at zero.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        match (self.final_time, self.heist_start) {
            (Some(end), Some(start)) => (end - start).max(0.0),
            (Some(end), None) => end.max(0.0),
            _ => 0.0,
        }
    }
}
