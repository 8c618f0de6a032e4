//! Decay and load-aggregation engine for the half-life dose tracker.
//!
//! # Core Concepts
//!
//! - [`Dose`]: a single logged administration. The only persisted entity.
//! - [`DecayedDose`]: a dose evaluated at an instant, carrying how much of it
//!   is still active.
//! - [`DailyLoad`]: every eligible dose evaluated at one instant, with the
//!   summed total load.
//! - [`DayLoad`]: one point of the trailing load history.
//!
//! Everything here is a pure function over caller-supplied data. Nothing is
//! cached and nothing is mutated, so evaluations can run in any order or in
//! parallel.

pub mod decay;
pub mod load;
pub mod model;
pub mod presentation;

pub use decay::{evaluate, HALF_LIFE_DAYS, HALF_LIFE_HOURS};
pub use load::{aggregate, is_eligible, trailing_history, DEFAULT_HISTORY_DAYS};
pub use model::*;
pub use presentation::{bar_width, color_intensity, rgba, DoseDisplay, DoseTier, HistoryBar};
