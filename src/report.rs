//! Console rendering of run outcomes.

use std::fmt::Write as _;

use crate::parser::Phase;
use crate::session::RunOutcome;
use crate::timing::{PhaseTiming, RelativeRun};

const RULE: &str = "------------------------------------------------------------------------";

/// `[m:ss]`.
#[must_use]
pub fn time_brackets(seconds: f64) -> String {
    let (minutes, secs, _) = split(seconds);
    format!("[{minutes}:{secs:02}]")
}

/// `Xm YYs ZZZms`, or `Ys Zms` below one minute.
#[must_use]
pub fn time_units(seconds: f64) -> String {
    let (minutes, secs, millis) = split(seconds);
    if minutes == 0 {
        format!("{secs}s {millis}ms")
    } else {
        format!("{minutes}m {secs:02}s {millis:03}ms")
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn split(seconds: f64) -> (u64, u64, u64) {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    (
        total_millis / 60_000,
        (total_millis / 1000) % 60,
        total_millis % 1000,
    )
}

/// Joins names as "a", "a and b" or "a, b, and c".
#[must_use]
pub fn oxford_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [one] => one.as_ref().to_owned(),
        [a, b] => format!("{} and {}", a.as_ref(), b.as_ref()),
        [rest @ .., last] => {
            let head: Vec<&str> = rest.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Renders one outcome as it would appear live.
#[must_use]
pub fn render_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Completed(run) => render_run(run),
        RunOutcome::Aborted {
            run_number,
            reason,
            broken,
            ..
        } => {
            let mut out = format!("Run #{run_number} was aborted because {reason}.\n");
            if let Some(broken) = broken.as_ref().filter(|b| b.total_time > 0.0) {
                let _ = writeln!(
                    out,
                    "If Profit-Taker was killed, the run likely lasted around {}.",
                    time_units(broken.total_time)
                );
            }
            out
        }
        RunOutcome::Bugged {
            run_number,
            reasons,
        } => {
            let mut out = format!("Run #{run_number} was bugged and cannot be shown:\n");
            for reason in reasons {
                let _ = writeln!(out, " - {reason}");
            }
            out
        }
    }
}

/// Renders every outcome of a finished log, separated by blank lines.
#[must_use]
pub fn render_all(outcomes: &[RunOutcome]) -> String {
    if outcomes.is_empty() {
        return "No Profit-Taker runs were found in this log.\n".to_owned();
    }
    outcomes
        .iter()
        .map(render_outcome)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_run(run: &RelativeRun) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let player = if run.nickname.is_empty() {
        "an unknown player"
    } else {
        run.nickname.as_str()
    };
    let _ = write!(
        out,
        "Profit-Taker Run #{} by {player} cleared in {}",
        run.run_number,
        time_units(run.length())
    );
    if run.best_run {
        out.push_str("  (best run)");
    } else if run.best_run_yet {
        out.push_str("  (best so far)");
    }
    out.push('\n');

    if !run.squad_members.is_empty() {
        let members: Vec<&String> = run.squad_members.iter().collect();
        let _ = writeln!(out, "With {}", oxford_join(&members));
    }
    let _ = writeln!(
        out,
        "From elevator to Profit-Taker took {:.3}s. Fight duration: {}.",
        run.flight,
        time_units(run.length() - run.flight)
    );
    if run.bugged {
        out.push_str(
            "The shield cycling bug hit this run: phase 3 pylon time and the first phase 4 shield are unknown.\n",
        );
    }
    out.push('\n');

    for phase in &run.phases {
        render_phase(&mut out, phase);
        if phase.phase == Phase::Three && !run.pylon_shields.is_empty() {
            let names: Vec<&str> = run.pylon_shields.iter().map(|s| s.element.name()).collect();
            let _ = writeln!(out, "  Shields during pylons: {}", names.join(" | "));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "> Sum of parts {}", time_brackets(run.sum_of_parts()));
    let _ = writeln!(out, "  Shield change: {:>9.3}s", run.shield_sum());
    let _ = writeln!(out, "  Leg break:     {:>9.3}s", run.leg_sum());
    let _ = writeln!(out, "  Body killed:   {:>9.3}s", run.body_sum());
    let _ = writeln!(out, "  Pylons:        {:>9.3}s", run.pylon_sum());

    for anomaly in &run.anomalies {
        let _ = writeln!(out, "! {anomaly}");
    }
    let _ = writeln!(out, "{RULE}");
    out
}

fn render_phase(out: &mut String, phase: &PhaseTiming) {
    let _ = writeln!(out, "> Phase {} {}", phase.phase, time_brackets(phase.elapsed));
    if !phase.shields.is_empty() {
        let parts: Vec<String> = phase
            .shields
            .iter()
            .map(|s| match s.duration {
                Some(d) => format!("{} {d:.3}s", s.element),
                None => format!("{} ?", s.element),
            })
            .collect();
        let _ = writeln!(
            out,
            "  Shield change: {:>9.3}s - {}",
            phase.shield_sum(),
            parts.join(" | ")
        );
    }
    let parts: Vec<String> = phase
        .legs
        .iter()
        .map(|l| format!("{} {:.3}s", l.slot.abbreviation(), l.duration))
        .collect();
    let _ = writeln!(
        out,
        "  Leg break:     {:>9.3}s - {}",
        phase.leg_sum(),
        parts.join(" | ")
    );
    let _ = writeln!(out, "  Body killed:   {:>9.3}s", phase.body);
    if let Some(pylon) = phase.pylon {
        let _ = writeln!(out, "  Pylons:        {pylon:>9.3}s");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AbortReason;
    use crate::timing::BrokenRunSummary;

    #[test]
    fn bracket_times() {
        assert_eq!(time_brackets(0.0), "[0:00]");
        assert_eq!(time_brackets(83.9), "[1:23]");
        assert_eq!(time_brackets(600.0), "[10:00]");
    }

    #[test]
    fn unit_times() {
        assert_eq!(time_units(7.25), "7s 250ms");
        assert_eq!(time_units(312.04), "5m 12s 040ms");
        assert_eq!(time_units(-3.0), "0s 0ms");
    }

    #[test]
    fn oxford_join_forms() {
        assert_eq!(oxford_join::<&str>(&[]), "");
        assert_eq!(oxford_join(&["a"]), "a");
        assert_eq!(oxford_join(&["a", "b"]), "a and b");
        assert_eq!(oxford_join(&["a", "b", "c"]), "a, b, and c");
    }

    #[test]
    fn aborted_run_mentions_estimate() {
        let outcome = RunOutcome::Aborted {
            run_number: 4,
            reason: AbortReason::ReturnedToTown,
            require_start: true,
            broken: Some(BrokenRunSummary {
                run_number: 4,
                nickname: String::new(),
                squad_members: std::collections::BTreeSet::new(),
                total_time: 95.5,
            }),
        };
        let text = render_outcome(&outcome);
        assert!(text.starts_with("Run #4 was aborted because the player returned to town."));
        assert!(text.contains("1m 35s 500ms"));
    }

    #[test]
    fn bugged_run_lists_every_reason() {
        let outcome = RunOutcome::Bugged {
            run_number: 2,
            reasons: vec!["first".into(), "second".into()],
        };
        let text = render_outcome(&outcome);
        assert!(text.contains(" - first\n"));
        assert!(text.contains(" - second\n"));
    }

    #[test]
    fn empty_log_has_a_message() {
        assert!(render_all(&[]).contains("No Profit-Taker runs"));
    }
}
