use std::convert::Infallible;
use std::io::BufRead;
use std::time::Duration;

use clap::Parser;
use embassy_executor::Executor;
use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embedded_hal::{digital, pwm};
use static_cell::StaticCell;
use tank_core::utils::controllers::{decode_command, MotionCommand, MotionControl, TankController};
use tank_core::utils::{Polarity, MOTION_CHANNEL};
use tracing::{error, info, warn};

#[derive(Parser)]
#[clap(version = "1.0", about = "Run the tank motor controller against logging fake pins")]
struct Opts {
    /// Curve speed threshold (0-255)
    #[clap(long)]
    threshold: Option<u8>,
    /// Left motor is wired in reverse
    #[clap(long)]
    reverse_left: bool,
    /// Right motor is wired in reverse
    #[clap(long)]
    reverse_right: bool,
}

/// Speed output that logs every duty it is given.
struct LogPwm(&'static str);

impl pwm::ErrorType for LogPwm {
    type Error = Infallible;
}

impl pwm::SetDutyCycle for LogPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        info!("{} duty: {}", self.0, duty);
        Ok(())
    }
}

/// Direction output that logs its level.
struct LogPin(&'static str);

impl digital::ErrorType for LogPin {
    type Error = Infallible;
}

impl digital::OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        info!("{} dir: low", self.0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        info!("{} dir: high", self.0);
        Ok(())
    }
}

/// Raised by the stdin reader once its input is exhausted.
static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Serve `MOTION_CHANNEL` until shutdown, then drain it, stop the motors
/// and exit.
#[embassy_executor::task]
async fn motion_task(mut ctrl: TankController<LogPwm, LogPin>) {
    if let Either::First(never) = select(ctrl.motion_ch(), SHUTDOWN.wait()).await {
        match never {}
    }

    while let Ok(cmd) = MOTION_CHANNEL.try_receive() {
        if let Err(e) = ctrl.execute_command(cmd) {
            error!("Motion command failed: {:?}", e);
        }
    }
    match ctrl.execute_command(MotionCommand::Stop) {
        Ok(_) => info!("motors stopped, exiting"),
        Err(e) => error!("final stop failed: {:?}", e),
    }
    std::process::exit(0);
}

/// Forward JSON commands from stdin, one per line, to `MOTION_CHANNEL`.
///
/// Signals `SHUTDOWN` once stdin closes.
fn stdin_reader() {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("stdin read failed: {:?}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match decode_command(line.as_bytes()) {
            Ok(cmd) => enqueue(cmd),
            Err(error) => error!(?error, "error deserializing MotionCommand"),
        }
    }

    info!("stdin closed");
    SHUTDOWN.signal(());
}

fn enqueue(cmd: MotionCommand) {
    while MOTION_CHANNEL.try_send(cmd).is_err() {
        warn!("motion queue full, retrying");
        std::thread::sleep(Duration::from_millis(10));
    }
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();
    let polarity = Polarity::new(opts.reverse_left, opts.reverse_right);

    let motion = MotionControl::new(
        LogPwm("left"),
        LogPin("left"),
        LogPwm("right"),
        LogPin("right"),
    );
    let ctrl = TankController::new(motion, opts.threshold, Some(polarity));

    std::thread::spawn(stdin_reader);

    info!("Reading motion commands from stdin");
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(motion_task(ctrl)).unwrap();
    });
}
