//! Models exchanged at the HTTP boundary.
//!
//! # Core Concepts
//!
//! The persisted and derived records ([`Dose`], [`DecayedDose`],
//! [`DailyLoad`], [`DayLoad`]) live in `halflife-core` and are re-exported
//! here. This module adds what only the boundary needs:
//!
//! - [`DoseInput`]: raw create/update payload, checked by
//!   [`DoseInput::validate`] before anything reaches the store.
//! - [`LoadView`] and [`HistoryView`]: derived figures plus display hints,
//!   as served to clients.

mod input;
mod view;

pub use halflife_core::model::*;
pub use halflife_core::presentation::{DoseDisplay, DoseTier, HistoryBar};
pub use input::*;
pub use view::*;
