//! Structural completeness checks for a post-processed run.

use tracing::warn;

use super::run::{AbsoluteRun, Phase};

/// Shield switches a shield phase needs at minimum. Five is normal; damage
/// capped to the element's max HP can skip up to two.
pub const MIN_SHIELDS: usize = 3;
pub const MIN_LEGS: usize = 4;
/// Leg kills beyond this point to a worse bug than leg regeneration.
pub const MAX_LEGS: usize = 8;

/// Collects every structural deficiency of `run`.
///
/// An empty list means the run can be converted to relative timings.
#[must_use]
pub fn failure_reasons(run: &AbsoluteRun) -> Vec<String> {
    let mut reasons = Vec::new();
    for phase in Phase::ALL {
        let record = run.phase(phase);

        if phase.has_shields() && record.shields.len() < MIN_SHIELDS {
            reasons.push(format!(
                "{} shield elements were recorded in phase {phase} but at least {MIN_SHIELDS} shield elements were expected.",
                record.shields.len()
            ));
        }
        if record.legs.len() < MIN_LEGS {
            reasons.push(format!(
                "{} legs were recorded in phase {phase} but at least {MIN_LEGS} legs were expected.",
                record.legs.len()
            ));
        }
        if record.body_vulnerable.is_none() {
            reasons.push(format!(
                "Profit-Taker's body was not recorded as being vulnerable in phase {phase}."
            ));
        }
        if record.body_killed.is_none() {
            reasons.push(format!(
                "Profit-Taker's body was not recorded as being killed in phase {phase}."
            ));
        }
        if phase.has_pylons() {
            if record.pylon_start.is_none() {
                reasons.push(format!("No pylon phase start time was recorded in phase {phase}."));
            }
            let end_optional = run.bugged && phase == Phase::Three;
            if record.pylon_end.is_none() && !end_optional {
                reasons.push(format!("No pylon phase end time was recorded in phase {phase}."));
            }
        }
    }
    reasons
}

/// Non-fatal oddities worth surfacing to the user.
#[must_use]
pub fn anomalies(run: &AbsoluteRun) -> Vec<String> {
    Phase::ALL
        .into_iter()
        .filter_map(|phase| {
            let legs = run.phase(phase).legs.len();
            (legs > MAX_LEGS).then(|| {
                warn!(run = run.run_number, %phase, legs, "unusually many leg kills");
                format!(
                    "{legs} leg kills were recorded for phase {phase}. If you have a recording of this run and the fight indeed bugged out, please report the bug to Warframe."
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::element::ShieldElement;
    use crate::parser::run::{LegEvent, LegSlot, ShieldEvent};

    fn complete_run() -> AbsoluteRun {
        let mut run = AbsoluteRun::new(1);
        for phase in Phase::ALL {
            let record = run.phase_mut(phase);
            if phase.has_shields() {
                record.shields = (0..3)
                    .map(|i| ShieldEvent {
                        element: ShieldElement::Cold,
                        time: f64::from(i),
                    })
                    .collect();
            }
            record.legs = (0..4)
                .map(|i| LegEvent {
                    slot: LegSlot::FrontLeft,
                    time: f64::from(i),
                })
                .collect();
            record.body_vulnerable = Some(1.0);
            record.body_killed = Some(2.0);
            if phase.has_pylons() {
                record.pylon_start = Some(3.0);
                record.pylon_end = Some(4.0);
            }
        }
        run
    }

    #[test]
    fn complete_run_has_no_reasons() {
        assert!(failure_reasons(&complete_run()).is_empty());
    }

    #[test]
    fn all_deficiencies_are_reported_together() {
        let mut run = complete_run();
        run.phase_mut(Phase::Two).legs.truncate(2);
        run.phase_mut(Phase::Four).shields.truncate(1);
        run.phase_mut(Phase::One).pylon_start = None;

        let reasons = failure_reasons(&run);
        assert_eq!(
            reasons,
            vec![
                "No pylon phase start time was recorded in phase 1.".to_string(),
                "2 legs were recorded in phase 2 but at least 4 legs were expected.".to_string(),
                "1 shield elements were recorded in phase 4 but at least 3 shield elements were expected."
                    .to_string(),
            ]
        );
    }

    #[test]
    fn missing_phase_three_pylon_end_is_tolerated_when_bugged() {
        let mut run = complete_run();
        run.phase_mut(Phase::Three).pylon_end = None;
        assert_eq!(failure_reasons(&run).len(), 1);

        run.bugged = true;
        assert!(failure_reasons(&run).is_empty());

        run.phase_mut(Phase::One).pylon_end = None;
        assert_eq!(
            failure_reasons(&run),
            vec!["No pylon phase end time was recorded in phase 1.".to_string()]
        );
    }

    #[test]
    fn body_timestamps_are_required() {
        let mut run = complete_run();
        run.phase_mut(Phase::Three).body_killed = None;
        run.phase_mut(Phase::Three).body_vulnerable = None;
        assert_eq!(
            failure_reasons(&run),
            vec![
                "Profit-Taker's body was not recorded as being vulnerable in phase 3.".to_string(),
                "Profit-Taker's body was not recorded as being killed in phase 3.".to_string(),
            ]
        );
    }

    #[test]
    fn too_many_legs_is_an_anomaly_not_a_failure() {
        let mut run = complete_run();
        let extra = run.phase(Phase::Two).legs[0];
        run.phase_mut(Phase::Two).legs.extend([extra; 5]);
        assert!(failure_reasons(&run).is_empty());
        let found = anomalies(&run);
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("9 leg kills were recorded for phase 2."));
    }
}
