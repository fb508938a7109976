//! Integration test crate for Storyline.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! Every test parses an inline FCPXML fixture and drives the model and
//! extraction crates together.

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod documents;


#[cfg(test)]
mod roles;

#[cfg(test)]
mod occlusion;
