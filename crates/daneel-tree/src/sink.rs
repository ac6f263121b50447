//! Trajectory sinks: where planned motion goes on the real side.

use daneel_core::Trajectory;

/// External trajectory consumer (joint controller bridge, file writer,
/// test collector). Dispatch failures surface as `ExecutionError`; they
/// never corrupt the blackboard.
pub trait TrajectorySink {
    fn dispatch(&mut self, trajectory: &Trajectory) -> Result<(), String>;

    /// The last successfully dispatched trajectory, if the sink keeps it.
    fn last(&self) -> Option<&Trajectory> {
        None
    }
}

/// Sink that keeps every dispatched trajectory. Used in tests and by the
/// CLI to write results out after the motion finishes.
#[derive(Debug, Default)]
pub struct CollectSink {
    trajectories: Vec<Trajectory>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Trajectory] {
        &self.trajectories
    }
}

impl TrajectorySink for CollectSink {
    fn dispatch(&mut self, trajectory: &Trajectory) -> Result<(), String> {
        self.trajectories.push(trajectory.clone());
        Ok(())
    }

    fn last(&self) -> Option<&Trajectory> {
        self.trajectories.last()
    }
}
