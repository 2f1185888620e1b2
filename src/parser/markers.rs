//! Fixed substrings that identify significant `EE.log` lines.

use super::run::Phase;

/// Shield element switch; the element is the last token of the line.
pub const SHIELD_SWITCH: &str = "SwitchShieldVulnerability";

/// Transmissions that close a shield sub-stage. Any of them ends the
/// shield sub-stage of whichever phase is current.
pub const SHIELD_PHASE_ENDINGS: [&str; 3] = [
    "GiveItem Queuing resource load for Transmission: /Lotus/Sounds/Dialog/FortunaOrbHeist/Business/DBntyFourInterPrTk0920TheBusiness",
    "GiveItem Queuing resource load for Transmission: /Lotus/Sounds/Dialog/FortunaOrbHeist/Business/DBntyFourInterPrTk0890TheBusiness",
    "GiveItem Queuing resource load for Transmission: /Lotus/Sounds/Dialog/FortunaOrbHeist/Business/DBntyFourSatelReal0930TheBusiness",
];

pub const LEG_KILL: &str = "Leg freshly destroyed at part";
pub const BODY_VULNERABLE: &str = "Camper->StartVulnerable() - The Camper can now be damaged!";
pub const STATE_CHANGE: &str = "CamperHeistOrbFight.lua: Landscape - New State: ";
pub const PYLONS_LAUNCHED: &str = "Pylon launch complete";
pub const BOSS_FOUND: &str = "Orb Fight - Starting first attack Orb phase";

const PHASE_1_END: &str = "Orb Fight - Starting second attack Orb phase";
const PHASE_2_END: &str = "Orb Fight - Starting third attack Orb phase";
const PHASE_3_END: &str = "Orb Fight - Starting final attack Orb phase";

/// State-change codes that mark the body kill of phases 1, 2 and 3.
pub const BODY_KILL_STATES: [u32; 3] = [3, 5, 6];

/// Seconds between two phase-3 shield switches below which the fight is
/// considered to have hit the pylon shield-cycling bug.
pub const BUGGED_SHIELD_GAP_SECS: f64 = 25.0;

pub const SESSION_START: &str = "Sys [Diag]: Current time:";
pub const NICKNAME: &str = "Net [Info]: name: ";
pub const SQUAD_MEMBER: &str = "loadout loader finished.";
pub const ENCOUNTER_START: &str =
    "jobId=/Lotus/Types/Gameplay/Venus/Jobs/Heists/HeistProfitTakerBountyFour";
pub const HOST_MIGRATION: &str =
    "\"jobId\" : \"/Lotus/Types/Gameplay/Venus/Jobs/Heists/HeistProfitTakerBountyFour";
pub const ZONE_EXIT: &str = "EidolonMP.lua: EIDOLONMP: Avatar left the zone";
pub const BACK_TO_TOWN: &str = "EidolonMP.lua: EIDOLONMP: TryTownTransition";
pub const MISSION_END: &str = "GameRulesImpl - changing state from SS_STARTED to SS_ENDING";

/// Private-use glyph the game appends to names (platform icon).
pub const NAME_GLYPH: char = '\u{e000}';

/// Returns the cue that ends `phase`, if the phase ends on a cue.
///
/// Phase 4 has none: it ends on the third body vulnerability.
#[must_use]
pub const fn phase_end(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::One => Some(PHASE_1_END),
        Phase::Two => Some(PHASE_2_END),
        Phase::Three => Some(PHASE_3_END),
        Phase::Four => None,
    }
}

/// Whether `line` contains any of the shield-phase ending transmissions.
#[must_use]
pub fn is_shield_phase_ending(line: &str) -> bool {
    SHIELD_PHASE_ENDINGS.iter().any(|cue| line.contains(cue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_migration_does_not_look_like_encounter_start() {
        assert!(!HOST_MIGRATION.contains(ENCOUNTER_START));
        assert!(!ENCOUNTER_START.contains(HOST_MIGRATION));
    }

    #[test]
    fn final_phase_has_no_end_cue() {
        assert!(phase_end(Phase::Four).is_none());
        assert!(phase_end(Phase::One).is_some_and(|cue| cue.contains("second")));
    }

    #[test]
    fn boss_found_is_not_a_phase_end() {
        for phase in Phase::ALL {
            if let Some(cue) = phase_end(phase) {
                assert!(!BOSS_FOUND.contains(cue));
            }
        }
    }
}
