//! Shield elements and their log spellings.
//!
//! Every element has a display name and the internal damage-type token that
//! appears in `SwitchShieldVulnerability` lines. Lookup goes through a single
//! case-insensitive alias table built on first use.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Elemental category a shield sub-stage is vulnerable to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShieldElement {
    Impact,
    Puncture,
    Slash,
    Cold,
    Heat,
    Toxin,
    Electricity,
    Gas,
    Viral,
    Magnetic,
    Radiation,
    Corrosive,
    Blast,
    /// Token the alias table does not know; the switch still counts.
    Unknown,
}

/// Canonical element ↔ (display name, internal token).
const SPELLINGS: [(ShieldElement, &str, &str); 13] = [
    (ShieldElement::Impact, "Impact", "DT_IMPACT"),
    (ShieldElement::Puncture, "Puncture", "DT_PUNCTURE"),
    (ShieldElement::Slash, "Slash", "DT_SLASH"),
    (ShieldElement::Cold, "Cold", "DT_FREEZE"),
    (ShieldElement::Heat, "Heat", "DT_FIRE"),
    (ShieldElement::Toxin, "Toxin", "DT_POISON"),
    (ShieldElement::Electricity, "Electricity", "DT_ELECTRICITY"),
    (ShieldElement::Gas, "Gas", "DT_GAS"),
    (ShieldElement::Viral, "Viral", "DT_VIRAL"),
    (ShieldElement::Magnetic, "Magnetic", "DT_MAGNETIC"),
    (ShieldElement::Radiation, "Radiation", "DT_RADIATION"),
    (ShieldElement::Corrosive, "Corrosive", "DT_CORROSIVE"),
    (ShieldElement::Blast, "Blast", "DT_EXPLOSION"),
];

static ALIASES: LazyLock<HashMap<String, ShieldElement>> = LazyLock::new(|| {
    SPELLINGS
        .iter()
        .flat_map(|&(element, name, internal)| {
            [
                (name.to_lowercase(), element),
                (internal.to_lowercase(), element),
            ]
        })
        .collect()
});

impl ShieldElement {
    /// Resolves any accepted spelling, ignoring case.
    #[must_use]
    pub fn from_alias(token: &str) -> Option<Self> {
        ALIASES.get(&token.to_lowercase()).copied()
    }

    /// Human-readable name, e.g. `"Cold"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.spelling().map_or("Unknown", |(name, _)| name)
    }

    /// Token the game writes to the log, e.g. `"DT_FREEZE"`.
    #[must_use]
    pub fn internal_name(self) -> Option<&'static str> {
        self.spelling().map(|(_, internal)| internal)
    }

    fn spelling(self) -> Option<(&'static str, &'static str)> {
        SPELLINGS
            .iter()
            .find(|(element, _, _)| *element == self)
            .map(|&(_, name, internal)| (name, internal))
    }
}

impl fmt::Display for ShieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
