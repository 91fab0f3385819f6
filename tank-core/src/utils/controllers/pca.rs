//! PCA9685-backed motor outputs.
//!
//! Tank boards that hang both motors off a PCA9685 use one channel per
//! speed line and one per direction line. [`PcaOutput`] exposes a single
//! channel as either an `embedded-hal` PWM output or a digital output, so a
//! [`MotionControl`](super::motion::MotionControl) can drive the chip
//! directly. Outputs share the chip through a `RefCell`. As a digital
//! output the channel uses the chip's full-on / full-off bits, so the level
//! is steady rather than a near-100% duty.

use core::cell::RefCell;

use embedded_hal::{digital, i2c::I2c, pwm};
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address, Channel, Error, Pca9685};

/// Full-scale count of a PCA9685 channel.
pub const MAX_DUTY: u16 = 4095;

/// PCA9685 on a bus shared with other I2C devices.
pub type SharedPca<'a, I2C> = RefCell<Pca9685<RefCellDevice<'a, I2C>>>;

/// A PCA9685 error surfaced through the `embedded-hal` error traits.
#[derive(Debug)]
pub struct PcaError<E: core::fmt::Debug>(pub Error<E>);

impl<E: core::fmt::Debug> pwm::Error for PcaError<E> {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

impl<E: core::fmt::Debug> digital::Error for PcaError<E> {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Create a PCA9685 handle on a shared bus.
pub fn shared_pca<'a, I2C, E>(
    bus: &'a RefCell<I2C>,
    address: u8,
) -> Result<SharedPca<'a, I2C>, PcaError<E>>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    let pca = Pca9685::new(RefCellDevice::new(bus), Address::from(address)).map_err(PcaError)?;
    Ok(RefCell::new(pca))
}

/// Wake the chip and set the PWM prescale.
pub fn configure_pwm<I2C, E>(
    pca: &RefCell<Pca9685<I2C>>,
    prescale: u8,
) -> Result<(), PcaError<E>>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    let mut pca = pca.borrow_mut();
    pca.enable().map_err(PcaError)?;
    tracing::info!("PWM enabled");
    pca.set_prescale(prescale).map_err(PcaError)?;
    tracing::info!(prescale, "PWM prescale set");
    Ok(())
}

/// One PCA9685 channel used as a motor speed or direction line.
pub struct PcaOutput<'p, I2C> {
    pca: &'p RefCell<Pca9685<I2C>>,
    channel: Channel,
}

impl<'p, I2C, E> PcaOutput<'p, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    pub fn new(
        pca: &'p RefCell<Pca9685<I2C>>,
        channel: Channel,
    ) -> Self {
        Self { pca, channel }
    }

    fn set_off(
        &mut self,
        off: u16,
    ) -> Result<(), PcaError<E>> {
        self.pca
            .borrow_mut()
            .set_channel_on_off(self.channel, 0, off.min(MAX_DUTY))
            .map_err(PcaError)
    }
}

impl<I2C, E> pwm::ErrorType for PcaOutput<'_, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type Error = PcaError<E>;
}

impl<I2C, E> pwm::SetDutyCycle for PcaOutput<'_, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    fn max_duty_cycle(&self) -> u16 {
        MAX_DUTY
    }

    fn set_duty_cycle(
        &mut self,
        duty: u16,
    ) -> Result<(), PcaError<E>> {
        self.set_off(duty)
    }
}

impl<I2C, E> digital::ErrorType for PcaOutput<'_, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type Error = PcaError<E>;
}

impl<I2C, E> digital::OutputPin for PcaOutput<'_, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    fn set_low(&mut self) -> Result<(), PcaError<E>> {
        self.pca
            .borrow_mut()
            .set_channel_full_off(self.channel)
            .map_err(PcaError)
    }

    /// Full-off takes precedence over full-on, so clear it first.
    fn set_high(&mut self) -> Result<(), PcaError<E>> {
        let mut pca = self.pca.borrow_mut();
        pca.set_channel_off(self.channel, 0).map_err(PcaError)?;
        pca.set_channel_full_on(self.channel, 0).map_err(PcaError)
    }
}
