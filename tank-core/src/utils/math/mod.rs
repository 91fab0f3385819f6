//! Math utilities for the tank robot.
//!
//! This module provides differential-drive mixing for two-track vehicles.

pub mod differential;
