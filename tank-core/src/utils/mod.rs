//! Utility re-exports for the tank robot.
//!
//! - `controllers`: motor driver, PCA9685 outputs and command dispatch
//! - `math`: differential-drive mixing of motion intents into track speeds

pub mod controllers;
pub mod math;

pub use controllers::{MotionCommand, MotionControl, TankController, MOTION_CHANNEL};
pub use math::differential::{Direction, Polarity, Turn, Wheels};
