//! Linear Kalman filtering: a single-pass filter (`filter::LKFilter`) and
//! the bidirectional wrapper (`bidirectional::TwoWayLKFilter`) built on
//! top of it.
//!
//! The original source overloads one filter object as both "the thing you
//! call `step` on" and "an iterator over its own measurement buffer" — the
//! design notes this crate follows call that out and ask for two separate
//! concerns instead. Here, `LKFilter::step` is the only primitive the fit
//! manager touches; `Sweep`/`BidirectionalSweep` are separate, deliberately
//! destructive iterator combinators built for standalone measurement-list
//! consumption, not for fitting.

pub mod bidirectional;
pub mod filter;

pub use bidirectional::TwoWayLKFilter;
pub use filter::LKFilter;
