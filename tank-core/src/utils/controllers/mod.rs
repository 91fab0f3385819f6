//! Module Exports
//!
//! This file exports the motor control modules of the tank robot.
//!
//! - `motion`: two-channel differential-drive motor driver.
//! - `pca`: PCA9685 channels used as motor speed and direction lines.

/// Module for driving the left and right tracks.
pub mod motion;
pub mod pca;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::{digital::OutputPin, pwm::SetDutyCycle};
use serde::{Deserialize, Serialize};

use crate::utils::math::differential::{
    Direction,
    Polarity,
    Turn,
    Wheels,
    DEFAULT_SPEED_THRESHOLD,
};

pub use motion::{DriverError, MotionControl, MotionError, MotorChannel};
pub use pca::{PcaError, PcaOutput};

/// Channel used to receive motion commands (`MotionCommand` messages).
pub static MOTION_CHANNEL: embassy_sync::channel::Channel<
    CriticalSectionRawMutex,
    MotionCommand,
    16,
> = embassy_sync::channel::Channel::new();

/// Motion command variants.
///
/// Serialized as JSON with tag `"mc"`, e.g.
/// `{"mc":"curve","d":"F","t":"L","lo":90,"hi":200}`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "mc", rename_all = "snake_case")]
pub enum MotionCommand {
    /// Both tracks in one direction.
    Drive { d: Direction, s: u8 },
    /// Pivot in place.
    Rotate { t: Turn, s: u8 },
    /// Arc with a slow inner and a fast outer track.
    Curve {
        d: Direction,
        t: Turn,
        lo: u8,
        hi: u8,
    },
    /// Raw signed speed per track.
    Direct { l: i16, r: i16 },
    Stop,
    /// Update the curve speed threshold.
    Threshold { v: u8 },
    /// Update the motor wiring polarity.
    Polarity { l: bool, r: bool },
}

/// Parse a single JSON-encoded `MotionCommand`.
pub fn decode_command(bytes: &[u8]) -> Result<MotionCommand, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Owns the motor driver and executes incoming motion commands.
pub struct TankController<P, D> {
    pub motion: MotionControl<P, D>,
}

impl<P, D> TankController<P, D>
where
    P: SetDutyCycle,
    D: OutputPin,
{
    /// Wrap a driver, applying the optional threshold and polarity.
    ///
    /// Unset values fall back to a threshold of 80 and normal polarity.
    pub fn new(
        mut motion: MotionControl<P, D>,
        speed_threshold: Option<u8>,
        polarity: Option<Polarity>,
    ) -> Self {
        motion.set_speed_threshold(speed_threshold.unwrap_or(DEFAULT_SPEED_THRESHOLD));
        motion.set_polarity(polarity.unwrap_or_default());
        TankController { motion }
    }

    /// Execute one `MotionCommand`.
    ///
    /// Returns the pair written to the motors, or `None` for configuration
    /// commands that do not move anything.
    pub fn execute_command(
        &mut self,
        command: MotionCommand,
    ) -> Result<Option<Wheels>, DriverError<P, D>> {
        let m = &mut self.motion;
        let out = match command {
            MotionCommand::Drive { d, s } => m.drive(d, s)?,
            MotionCommand::Rotate { t, s } => m.rotate(t, s)?,
            MotionCommand::Curve { d, t, lo, hi } => m.curve(d, t, lo, hi)?,
            MotionCommand::Direct { l, r } => m.direct(l, r)?,
            MotionCommand::Stop => m.stop()?,
            MotionCommand::Threshold { v } => {
                m.set_speed_threshold(v);
                return Ok(None);
            }
            MotionCommand::Polarity { l, r } => {
                m.set_polarity(Polarity::new(l, r));
                return Ok(None);
            }
        };
        Ok(Some(out))
    }

    /// Receive commands from `MOTION_CHANNEL` and execute them forever.
    pub async fn motion_ch(&mut self) -> ! {
        loop {
            let command = MOTION_CHANNEL.receiver().receive().await;
            tracing::info!("Received motion command: {:?}", command);
            match self.execute_command(command) {
                Ok(Some(wheels)) => tracing::info!(?wheels, "Motors updated"),
                Ok(None) => tracing::info!("Motion settings updated"),
                Err(e) => tracing::error!("Motion command failed: {:?}", e),
            }
        }
    }
}
