//! Visibility and pass prediction for tracked orbital objects.
//!
//! [`predict::PassEngine`] scans a set of [`predict::TrackedObject`]s against
//! one [`predict::GeoLocation`] and returns the intervals in which each object
//! is above the observer's horizon (and, optionally, inside an aperture cone).
//! Positions come from a [`predict::PositionProvider`]; [`predict::Sgp4Provider`]
//! propagates two-line elements.

pub mod config;
pub mod geometry;
pub mod predict;
pub mod web;
