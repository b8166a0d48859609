//! Domain types shared by the indicator engine, classifier and veto table.

pub mod point;
pub mod regime;

pub use point::PricePoint;
pub use regime::{Action, Regime, VetoPriority};
