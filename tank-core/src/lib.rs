//! Core drivers and utilities for a two-motor differential-drive (tank) robot
//! on no-std embedded platforms.
//!
//! For a host-side run against logging fake pins, see `tank-app/mock-mcu`.
#![no_std]

pub mod utils;
