//! This module provides common objects used throughout the entire application

pub mod error;
pub mod favorite;
pub mod file_handle;
pub mod filtering;
pub mod pet;
pub mod sorting;
pub mod user;
