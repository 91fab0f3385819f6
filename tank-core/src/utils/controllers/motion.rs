//! Two-channel motor driver for a differential-drive (tank) chassis.
//!
//! Each motor channel is a speed output (`SetDutyCycle`) plus a direction
//! output (`OutputPin`). Every motion primitive funnels through
//! [`MotionControl::direct`], which applies the wiring polarity exactly once
//! before anything is written to the pins.
//!
//! All calls are synchronous and must come from a single execution context;
//! a left/right pair is written back to back with no suspension point.

use embedded_hal::{
    digital::{self, OutputPin},
    pwm::{self, SetDutyCycle},
};

use crate::utils::math::differential::{
    self,
    Direction,
    Polarity,
    Turn,
    Wheels,
    DEFAULT_SPEED_THRESHOLD,
    MAX_SPEED,
};

/// Errors raised while commanding the motors.
#[derive(Debug, PartialEq)]
pub enum MotionError<PE, DE> {
    /// Writing a speed output failed.
    Pwm(PE),
    /// Writing a direction output failed.
    Direction(DE),
    /// A signed speed outside `[-255, 255]`; nothing was written.
    SpeedOutOfRange(i16),
}

/// Error type of a `MotionControl` built from speed outputs `P` and direction outputs `D`.
pub type DriverError<P, D> =
    MotionError<<P as pwm::ErrorType>::Error, <D as digital::ErrorType>::Error>;

/// One motor: a speed output and a direction output.
pub struct MotorChannel<P, D> {
    speed: P,
    dir: D,
}

impl<P, D> MotorChannel<P, D>
where
    P: SetDutyCycle,
    D: OutputPin,
{
    pub fn new(
        speed: P,
        dir: D,
    ) -> Self {
        Self { speed, dir }
    }

    /// Release the underlying outputs.
    pub fn free(self) -> (P, D) {
        (self.speed, self.dir)
    }

    /// Emit a signed speed: direction high for `value >= 0`, then the duty
    /// as `|value| / 255` of the output's range.
    fn write(
        &mut self,
        value: i16,
    ) -> Result<(), DriverError<P, D>> {
        if value >= 0 {
            self.dir.set_high().map_err(MotionError::Direction)?;
        } else {
            self.dir.set_low().map_err(MotionError::Direction)?;
        }
        self.speed
            .set_duty_cycle_fraction(value.unsigned_abs(), MAX_SPEED as u16)
            .map_err(MotionError::Pwm)
    }
}

/// Motor driver for the left and right tracks.
pub struct MotionControl<P, D> {
    left: MotorChannel<P, D>,
    right: MotorChannel<P, D>,
    polarity: Polarity,
    speed_threshold: u8,
    output: Wheels,
}

impl<P, D> MotionControl<P, D>
where
    P: SetDutyCycle,
    D: OutputPin,
{
    /// Take ownership of both channels' outputs.
    ///
    /// Does not touch the hardware. The threshold starts at 80 and neither
    /// motor is reversed.
    pub fn new(
        left_speed: P,
        left_dir: D,
        right_speed: P,
        right_dir: D,
    ) -> Self {
        Self::from_channels(
            MotorChannel::new(left_speed, left_dir),
            MotorChannel::new(right_speed, right_dir),
        )
    }

    pub fn from_channels(
        left: MotorChannel<P, D>,
        right: MotorChannel<P, D>,
    ) -> Self {
        Self {
            left,
            right,
            polarity: Polarity::NORMAL,
            speed_threshold: DEFAULT_SPEED_THRESHOLD,
            output: Wheels::STOP,
        }
    }

    /// Both tracks at `speed` in `direction`.
    pub fn drive(
        &mut self,
        direction: Direction,
        speed: u8,
    ) -> Result<Wheels, DriverError<P, D>> {
        self.direct_pair(differential::drive(direction, speed))
    }

    /// Pivot in place towards `turn`.
    pub fn rotate(
        &mut self,
        turn: Turn,
        speed: u8,
    ) -> Result<Wheels, DriverError<P, D>> {
        self.direct_pair(differential::rotate(turn, speed))
    }

    /// Arc towards `toward`, see [`differential::curve`] for how the speeds
    /// are placed against the threshold.
    pub fn curve(
        &mut self,
        direction: Direction,
        toward: Turn,
        low_speed: u8,
        high_speed: u8,
    ) -> Result<Wheels, DriverError<P, D>> {
        let wheels = differential::curve(
            direction,
            toward,
            low_speed,
            high_speed,
            self.speed_threshold,
        );
        self.direct_pair(wheels)
    }

    /// Set each track's signed speed independently.
    ///
    /// Returns the pair actually written, after polarity correction.
    pub fn direct(
        &mut self,
        left_speed: i16,
        right_speed: i16,
    ) -> Result<Wheels, DriverError<P, D>> {
        self.direct_pair(Wheels::new(left_speed, right_speed))
    }

    /// Zero both tracks. Same as `direct(0, 0)`.
    pub fn stop(&mut self) -> Result<Wheels, DriverError<P, D>> {
        self.direct_pair(Wheels::STOP)
    }

    pub fn set_speed_threshold(
        &mut self,
        threshold: u8,
    ) {
        tracing::info!(threshold, "speed threshold updated");
        self.speed_threshold = threshold;
    }

    pub fn speed_threshold(&self) -> u8 {
        self.speed_threshold
    }

    /// Change the wiring polarity. Takes effect on the next command.
    pub fn set_polarity(
        &mut self,
        polarity: Polarity,
    ) {
        tracing::info!(?polarity, "motor polarity updated");
        self.polarity = polarity;
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Last pair known to be on the outputs.
    ///
    /// A pair whose right half fails is rolled back on the left, so this
    /// never reports a value the tracks are not running.
    pub fn output(&self) -> Wheels {
        self.output
    }

    /// Release the four outputs as `(left_speed, left_dir, right_speed, right_dir)`.
    pub fn free(self) -> (P, D, P, D) {
        let (ls, ld) = self.left.free();
        let (rs, rd) = self.right.free();
        (ls, ld, rs, rd)
    }

    fn direct_pair(
        &mut self,
        wheels: Wheels,
    ) -> Result<Wheels, DriverError<P, D>> {
        if let Some(v) = wheels.out_of_range() {
            tracing::warn!(?wheels, "rejected speed {} out of range", v);
            return Err(MotionError::SpeedOutOfRange(v));
        }

        let previous = self.output;
        let out = self.polarity.apply(wheels);
        self.left.write(out.left)?;
        if let Err(e) = self.right.write(out.right) {
            tracing::error!("right track write failed: {:?}", e);
            self.roll_back_left(previous.left, out.left);
            return Err(e);
        }
        self.output = out;

        tracing::debug!(left = out.left, right = out.right, "motor output");
        Ok(out)
    }

    /// Return the left track to `previous` after the right track rejected
    /// its half of a pair. If that fails too, the left track is recorded at
    /// `attempted`, the value it last accepted.
    fn roll_back_left(
        &mut self,
        previous: i16,
        attempted: i16,
    ) {
        match self.left.write(previous) {
            Ok(()) => tracing::warn!(previous, "left track rolled back"),
            Err(e) => {
                self.output.left = attempted;
                tracing::error!("left track rollback failed: {:?}", e);
            }
        }
    }
}
