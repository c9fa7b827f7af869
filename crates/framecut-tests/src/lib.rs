//! Integration test crate for FrameCut.
//!
//! Holds cross-crate scenario tests and property tests; it has no code of
//! its own.

#[cfg(test)]
mod scenarios;

#[cfg(test)]
mod properties;
