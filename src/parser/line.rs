//! Field extraction from individual log lines.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use super::element::ShieldElement;
use super::markers::{NAME_GLYPH, SESSION_START, STATE_CHANGE};
use super::run::LegSlot;

/// One log line: absolute timestamp (seconds since the game started
/// writing the log) and the untouched text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent<'a> {
    pub time: f64,
    pub text: &'a str,
}

impl<'a> RawEvent<'a> {
    /// Splits off the leading timestamp token.
    ///
    /// Returns `None` for lines that do not start with a float, such as
    /// continuation lines of multi-line log entries.
    #[must_use]
    pub fn parse(text: &'a str) -> Option<Self> {
        let time = text.split_whitespace().next()?.parse::<f64>().ok()?;
        time.is_finite().then_some(Self { time, text })
    }

    /// Last whitespace-separated token.
    #[must_use]
    pub fn last_token(&self) -> Option<&'a str> {
        self.text.split_whitespace().next_back()
    }
}

/// Decodes the element of a `SwitchShieldVulnerability` line.
#[must_use]
pub fn shield_element(event: &RawEvent<'_>) -> ShieldElement {
    let token = event.last_token().unwrap_or_default();
    ShieldElement::from_alias(token).unwrap_or_else(|| {
        tracing::warn!(token, time = event.time, "unrecognized shield element");
        ShieldElement::Unknown
    })
}

/// Identifies the destroyed leg of a leg-kill line.
#[must_use]
pub fn leg_slot(text: &str) -> LegSlot {
    [
        ("ARM_LEFT", LegSlot::FrontLeft),
        ("ARM_RIGHT", LegSlot::FrontRight),
        ("LEG_LEFT", LegSlot::BackLeft),
        ("LEG_RIGHT", LegSlot::BackRight),
    ]
    .into_iter()
    .find_map(|(part, slot)| text.contains(part).then_some(slot))
    .unwrap_or(LegSlot::Unknown)
}

/// Numeric code of a landscape state-change line.
#[must_use]
pub fn state_code(text: &str) -> Option<u32> {
    let (_, rest) = text.split_once(STATE_CHANGE)?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Host nickname from a `Net [Info]: name:` line.
#[must_use]
pub fn nickname(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|&c| c != ',' && c != NAME_GLYPH)
        .collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens
        .len()
        .checked_sub(2)
        .map(|index| tokens[index].to_string())
}

/// Squad member name from a `loadout loader finished.` line.
#[must_use]
pub fn squad_member(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(|&c| c != NAME_GLYPH).collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens
        .len()
        .checked_sub(4)
        .map(|index| tokens[index].to_string())
}

static SESSION_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w{3} (\w{3})\s+(\d{1,2}) (\d{2}:\d{2}:\d{2}) (\d{4})").expect("valid regex")
});

/// Wall-clock session start from a `Sys [Diag]: Current time:` line.
#[must_use]
pub fn session_start(text: &str) -> Option<NaiveDateTime> {
    let (_, rest) = text.split_once(SESSION_START)?;
    let caps = SESSION_CLOCK.captures(rest)?;
    let stamp = format!("{} {} {} {}", &caps[4], &caps[1], &caps[2], &caps[3]);
    NaiveDateTime::parse_from_str(&stamp, "%Y %b %d %H:%M:%S").ok()
}
