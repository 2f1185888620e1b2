//! Shared integration-test harness: a builder for synthetic `EE.log`
//! content and helpers to feed it to the analyzer.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;

use pt_analyzer::parser::markers::{
    BACK_TO_TOWN, BODY_VULNERABLE, BOSS_FOUND, ENCOUNTER_START, HOST_MIGRATION, LEG_KILL,
    MISSION_END, PYLONS_LAUNCHED, SHIELD_PHASE_ENDINGS, SHIELD_SWITCH, STATE_CHANGE, ZONE_EXIT,
    phase_end,
};
use pt_analyzer::parser::Phase;
use pt_analyzer::session::{RunOutcome, Session};
use pt_analyzer::source::ReaderSource;

/// Elements cycled through by [`LogBuilder::shields`].
pub const ELEMENTS: [&str; 5] = ["DT_FREEZE", "DT_FIRE", "DT_VIRAL", "DT_MAGNETIC", "DT_EXPLOSION"];

/// Leg parts in the order [`LogBuilder::legs`] destroys them.
pub const LEG_PARTS: [&str; 4] = ["ARM_LEFT", "ARM_RIGHT", "LEG_LEFT", "LEG_RIGHT"];

/// Appends timestamped log lines with a monotonically advancing clock.
#[derive(Debug, Clone, Default)]
pub struct LogBuilder {
    text: String,
    time: f64,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current log time in seconds.
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Advances the clock by `dt` and appends `text` at the new time.
    pub fn at(&mut self, dt: f64, text: &str) -> &mut Self {
        self.time += dt;
        let _ = writeln!(self.text, "{:.3} {text}", self.time);
        self
    }

    /// Advances the clock without writing anything.
    pub fn idle(&mut self, dt: f64) -> &mut Self {
        self.time += dt;
        self
    }

    /// Appends a line without a timestamp.
    pub fn untimed(&mut self, text: &str) -> &mut Self {
        let _ = writeln!(self.text, "{text}");
        self
    }

    pub fn session_header(&mut self) -> &mut Self {
        self.at(
            0.5,
            "Sys [Diag]: Current time: Thu Mar  7 19:42:05 2024 [UTC: Thu Mar  7 18:42:05 2024]",
        )
    }

    pub fn nickname(&mut self, name: &str) -> &mut Self {
        self.at(0.1, &format!("Net [Info]: name: {name}\u{e000}, 0"))
    }

    pub fn squad_member(&mut self, name: &str) -> &mut Self {
        self.at(0.1, &format!("Game [Info]: {name}\u{e000} loadout loader finished."))
    }

    pub fn encounter_start(&mut self) -> &mut Self {
        self.at(1.0, &format!("Script [Info]: Mission {ENCOUNTER_START}"))
    }

    pub fn zone_exit(&mut self) -> &mut Self {
        self.at(2.0, &format!("Script [Info]: {ZONE_EXIT}"))
    }

    pub fn boss_found(&mut self) -> &mut Self {
        self.at(40.0, &format!("Script [Info]: {BOSS_FOUND}"))
    }

    /// `count` shield switches, `gap` seconds apart.
    pub fn shields(&mut self, count: usize, gap: f64) -> &mut Self {
        for element in ELEMENTS.iter().cycle().take(count) {
            self.at(
                gap,
                &format!(
                    "AI [Info]: Camper->{SHIELD_SWITCH}() - Switching shield damage vulnerability to {element}"
                ),
            );
        }
        self
    }

    pub fn shield_end(&mut self) -> &mut Self {
        self.at(1.5, &format!("Game [Info]: {}", SHIELD_PHASE_ENDINGS[0]))
    }

    /// `count` leg kills, 2 seconds apart.
    pub fn legs(&mut self, count: usize) -> &mut Self {
        for part in LEG_PARTS.iter().cycle().take(count) {
            self.at(2.0, &format!("AI [Info]: Camper->DestroyLeg() - {LEG_KILL}: {part}"));
        }
        self
    }

    pub fn body_vulnerable(&mut self) -> &mut Self {
        self.at(1.0, &format!("AI [Info]: {BODY_VULNERABLE}"))
    }

    pub fn state(&mut self, code: u32) -> &mut Self {
        self.at(3.0, &format!("Script [Info]: {STATE_CHANGE}{code}"))
    }

    pub fn pylons_launched(&mut self) -> &mut Self {
        self.at(4.0, &format!("Script [Info]: {PYLONS_LAUNCHED}"))
    }

    /// Cue closing phases 1 to 3.
    pub fn phase_end(&mut self, phase: Phase) -> &mut Self {
        let cue = phase_end(phase).unwrap_or_default();
        self.at(20.0, &format!("Script [Info]: {cue}"))
    }

    pub fn town(&mut self) -> &mut Self {
        self.at(5.0, &format!("Script [Info]: {BACK_TO_TOWN}"))
    }

    pub fn mission_end(&mut self) -> &mut Self {
        self.at(5.0, &format!("Game [Info]: {MISSION_END}"))
    }

    pub fn host_migration(&mut self) -> &mut Self {
        self.untimed(&format!("{HOST_MIGRATION}\","))
    }

    /// Everything up to the first shield of phase 1.
    pub fn intro(&mut self, nickname: &str) -> &mut Self {
        self.encounter_start()
            .nickname(nickname)
            .zone_exit()
            .boss_found()
    }

    /// One well-formed phase with `legs` leg kills.
    pub fn phase_with_legs(&mut self, phase: Phase, legs: usize) -> &mut Self {
        if phase.has_shields() {
            self.shields(5, 3.0).shield_end();
        }
        self.legs(legs);
        match phase {
            Phase::One => self.body_vulnerable().state(3).pylons_launched().phase_end(phase),
            Phase::Two => self.body_vulnerable().state(5).phase_end(phase),
            // One shield cycles while the pylons are up.
            Phase::Three => self
                .body_vulnerable()
                .state(6)
                .pylons_launched()
                .shields(1, 10.0)
                .phase_end(phase),
            Phase::Four => self.body_vulnerable().body_vulnerable().body_vulnerable(),
        }
    }

    pub fn phase(&mut self, phase: Phase) -> &mut Self {
        self.phase_with_legs(phase, 4)
    }

    /// A complete clean run.
    pub fn full_run(&mut self, nickname: &str) -> &mut Self {
        self.intro(nickname);
        for phase in Phase::ALL {
            self.phase(phase);
        }
        self
    }

    pub fn build(&self) -> String {
        self.text.clone()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, &self.text).expect("failed to write log fixture");
    }
}

/// In-memory finite source over `text`.
pub fn source(text: &str) -> ReaderSource<Cursor<Vec<u8>>> {
    ReaderSource::new(Cursor::new(text.as_bytes().to_vec()), "EE.log")
}

/// Analyzes `text` the way the one-shot command does.
pub fn analyze(text: &str) -> Vec<RunOutcome> {
    Session::new()
        .read_all(&mut source(text))
        .expect("in-memory source cannot fail")
}

/// Runs the `pt-analyzer` binary to completion.
pub fn run_cli(args: &[&str]) -> std::process::Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_pt-analyzer"))
        .args(args)
        .env_remove("PT_ANALYZER_FORMAT")
        .env_remove("PT_ANALYZER_LOG_LEVEL")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to spawn pt-analyzer")
}
