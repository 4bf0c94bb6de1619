//! The per-tick driver loop.
//!
//! The host owns time: each [`Driver::tick`] advances the host one step,
//! folds the fresh encoder and gyro readings into the estimators, runs the
//! active behavior once and sends its wheel command. Nothing here blocks; a
//! behavior that needs many ticks simply keeps answering
//! [`Progress::InProgress`].

use core::fmt;

use tern_kinematics::{DifferentialDrive, HeadingIntegrator, OdometryTracker};
use tracing::{debug, info, warn};

use crate::actuator::{DriveActuator, MotorInterface};
use crate::perception::{SensorSnapshot, UltrasonicRanges};

/// Whether a behavior needs more ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Call again on the next tick.
    InProgress,
    /// Target reached; the wheels have been stopped.
    Done,
}

impl Progress {
    /// True for [`Progress::Done`].
    pub fn is_done(self) -> bool {
        self == Progress::Done
    }
}

/// What a behavior sees and may touch during one tick.
pub struct Frame<'a> {
    /// Host time of this tick (s).
    pub time: f64,
    /// Integrated gyro heading (rad, unwrapped).
    pub heading: f64,
    /// Raw front obstacle reading.
    pub front: f64,
    /// Ultrasonic ranges with invalid readings replaced by the clear range.
    pub ranges: UltrasonicRanges,
    /// Wheel odometry, already updated for this tick.
    pub odometry: &'a mut OdometryTracker,
    /// Wheel command latch.
    pub actuator: &'a mut DriveActuator,
}

/// A tick-driven controller.
pub trait Behavior {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Runs one control step.
    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress;
}

impl<B: Behavior + ?Sized> Behavior for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn tick(&mut self, frame: &mut Frame<'_>) -> Progress {
        (**self).tick(frame)
    }
}

/// The robot body: a time source, sensors and motors.
pub trait RobotHost: MotorInterface {
    /// Advances one time step. Returns `false` when the host is shutting down.
    fn step(&mut self) -> bool;

    /// Sensor readings as of the most recent step.
    fn read(&self) -> SensorSnapshot;
}

/// Result of a single [`Driver::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The behavior wants more ticks.
    Continue,
    /// The behavior reported done.
    Finished,
    /// The host refused to step.
    HostTerminated,
    /// The configured tick budget ran out.
    TickLimit,
    /// The caller cancelled the run.
    Cancelled,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The behavior completed.
    Completed,
    /// The host stopped stepping first.
    HostTerminated,
    /// The tick budget ran out first.
    TickLimit,
    /// The run was cancelled by the caller.
    Cancelled,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunOutcome::Completed => "completed",
            RunOutcome::HostTerminated => "host terminated",
            RunOutcome::TickLimit => "tick limit reached",
            RunOutcome::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// End-of-run report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Ticks executed.
    pub ticks: u64,
    /// Host time elapsed since the driver was created (s).
    pub elapsed: f64,
    /// Signed odometry distance (m).
    pub cumulative_distance: f64,
    /// Unsigned odometry distance (m).
    pub path_length: f64,
    /// Final gyro heading (rad).
    pub heading: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {} ticks ({:.2} s): distance {:.3} m, path {:.3} m, heading {:.3} rad",
            self.outcome,
            self.ticks,
            self.elapsed,
            self.cumulative_distance,
            self.path_length,
            self.heading
        )
    }
}

/// Runs one behavior against one host.
pub struct Driver<H, B> {
    host: H,
    behavior: B,
    odometry: OdometryTracker,
    heading: HeadingIntegrator,
    actuator: DriveActuator,
    clear_range: f64,
    start_time: f64,
    last_time: f64,
    ticks: u64,
    max_ticks: Option<u64>,
    outcome: Option<RunOutcome>,
}

impl<H: RobotHost, B: Behavior> Driver<H, B> {
    /// Takes the host's current readings as the odometry and heading baseline.
    pub fn new(host: H, drive: DifferentialDrive, behavior: B, clear_range: f64) -> Self {
        let snapshot = host.read();
        let mut heading = HeadingIntegrator::new();
        heading.update(snapshot.gyro_z, snapshot.time);

        Driver {
            odometry: OdometryTracker::new(drive, snapshot.left_encoder, snapshot.right_encoder),
            heading,
            actuator: DriveActuator::new(drive),
            host,
            behavior,
            clear_range,
            start_time: snapshot.time,
            last_time: snapshot.time,
            ticks: 0,
            max_ticks: None,
            outcome: None,
        }
    }

    /// Caps the number of ticks [`Driver::run`] will execute.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Executes one tick: step host, update estimators, run behavior, send command.
    pub fn tick(&mut self) -> TickOutcome {
        if let Some(outcome) = self.outcome {
            return match outcome {
                RunOutcome::Completed => TickOutcome::Finished,
                RunOutcome::HostTerminated => TickOutcome::HostTerminated,
                RunOutcome::TickLimit => TickOutcome::TickLimit,
                RunOutcome::Cancelled => TickOutcome::Cancelled,
            };
        }
        if self.max_ticks.is_some_and(|max| self.ticks >= max) {
            warn!(ticks = self.ticks, behavior = self.behavior.name(), "Tick budget exhausted");
            self.outcome = Some(RunOutcome::TickLimit);
            return TickOutcome::TickLimit;
        }
        if !self.host.step() {
            warn!(ticks = self.ticks, behavior = self.behavior.name(), "Host requested shutdown");
            self.outcome = Some(RunOutcome::HostTerminated);
            return TickOutcome::HostTerminated;
        }
        self.ticks += 1;

        let snapshot = self.host.read();
        self.odometry.update(snapshot.left_encoder, snapshot.right_encoder);
        self.heading.update(snapshot.gyro_z, snapshot.time);
        self.last_time = snapshot.time;

        let mut frame = Frame {
            time: snapshot.time,
            heading: self.heading.angle(),
            front: snapshot.front_infrared,
            ranges: snapshot.ultrasonic.clamped(self.clear_range),
            odometry: &mut self.odometry,
            actuator: &mut self.actuator,
        };
        let progress = self.behavior.tick(&mut frame);
        self.actuator.flush(&mut self.host);

        match progress {
            Progress::InProgress => TickOutcome::Continue,
            Progress::Done => {
                debug!(ticks = self.ticks, behavior = self.behavior.name(), "Behavior finished");
                self.outcome = Some(RunOutcome::Completed);
                TickOutcome::Finished
            }
        }
    }

    /// Ticks until the behavior finishes, the host terminates or the tick
    /// budget runs out, then shuts down.
    pub fn run(&mut self) -> RunSummary {
        info!(behavior = self.behavior.name(), "Run started");
        while self.tick() == TickOutcome::Continue {}
        self.shutdown()
    }

    /// Marks the run as cancelled by the caller. Follow with [`Driver::shutdown`].
    pub fn cancel(&mut self) {
        if self.outcome.is_none() {
            info!(ticks = self.ticks, "Run cancelled");
            self.outcome = Some(RunOutcome::Cancelled);
        }
    }

    /// Sends a final stop. Unless the host already terminated, steps once
    /// more so the stop is applied before the run is reported.
    pub fn shutdown(&mut self) -> RunSummary {
        self.actuator.stop();
        self.actuator.flush(&mut self.host);
        let outcome = self.outcome.unwrap_or(RunOutcome::Cancelled);
        if outcome != RunOutcome::HostTerminated {
            self.host.step();
        }
        let summary = self.summary(outcome);
        info!(%summary, "Run finished");
        summary
    }

    /// Read access to the host, e.g. for reporting ground truth.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Read access to the behavior.
    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// Wheel odometry.
    pub fn odometry(&self) -> &OdometryTracker {
        &self.odometry
    }

    /// Integrated gyro heading (rad).
    pub fn heading(&self) -> f64 {
        self.heading.angle()
    }

    /// Ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn summary(&self, outcome: RunOutcome) -> RunSummary {
        RunSummary {
            outcome,
            ticks: self.ticks,
            elapsed: self.last_time - self.start_time,
            cumulative_distance: self.odometry.cumulative_distance(),
            path_length: self.odometry.path_length(),
            heading: self.heading.angle(),
        }
    }
}
