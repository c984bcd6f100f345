//! # Pet Market Library
//!
//! Core of the pet adoption marketplace: listing and favorite records, the
//! photo upload backends with their batch progress aggregator, the document
//! store seam and the signed-in session.
//!
//! The library is primarily used by the petmarket binary, but the services
//! take their collaborators as trait objects so they can be driven from tests
//! or other front ends.

#![forbid(unsafe_code)]

pub mod model;
pub mod services;
pub mod settings;
pub mod utils;
