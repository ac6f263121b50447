//! Joint states, trajectories, and tick bookkeeping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// State of a single joint as delivered by perception or the kinematic sim.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct SingleJointState {
    pub name: String,
    pub position: f64,
    pub velocity: f64,
    pub effort: f64,
}

impl SingleJointState {
    pub fn new(name: impl Into<String>, position: f64) -> Self {
        Self {
            name: name.into(),
            position,
            velocity: 0.0,
            effort: 0.0,
        }
    }
}

/// Ordered joint states, keyed by joint name.
///
/// Insertion order is semantic: it defines the column order of the QP.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct JointStates(pub IndexMap<String, SingleJointState>);

impl JointStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: SingleJointState) {
        self.0.insert(state.name.clone(), state);
    }

    pub fn get(&self, name: &str) -> Option<&SingleJointState> {
        self.0.get(name)
    }

    pub fn position(&self, name: &str) -> Option<f64> {
        self.0.get(name).map(|s| s.position)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SingleJointState)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<SingleJointState> for JointStates {
    fn from_iter<T: IntoIterator<Item = SingleJointState>>(iter: T) -> Self {
        let mut js = Self::new();
        for s in iter {
            js.insert(s);
        }
        js
    }
}

/// Ordered `(time, joint state)` samples appended once per planning tick.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Trajectory {
    samples: Vec<(f64, JointStates)>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Times must be non-decreasing.
    pub fn push(&mut self, time: f64, states: JointStates) {
        debug_assert!(
            self.samples.last().is_none_or(|(t, _)| *t <= time),
            "trajectory times must be non-decreasing"
        );
        self.samples.push((time, states));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&(f64, JointStates)> {
        self.samples.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, JointStates)> {
        self.samples.iter()
    }
}

/// Which universe the scheduler is currently ticking.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Universe {
    #[default]
    Real,
    Planning,
}

/// Small record advanced by the scheduler each tick.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct TickState {
    pub time: f64,
    pub tick_index: u64,
    pub universe: Universe,
}
