//! `EE.log` run reconstruction.
//!
//! [`read_run`] pulls lines from a [`LineSource`](crate::source::LineSource)
//! and drives a [`PhaseMachine`] through the four phases of the fight,
//! producing an [`AbsoluteRun`] in raw log time or a classified failure.

pub mod element;
pub mod line;
pub mod machine;
pub mod markers;
pub mod reader;
pub mod run;
pub mod validate;

pub use element::ShieldElement;
pub use machine::{AbortReason, PhaseMachine, Step};
pub use reader::{LogClock, ReadOutcome, read_run};
pub use run::{AbsoluteRun, LegEvent, LegSlot, Phase, PhaseRecord, ShieldEvent};
