//! Behaviour tree nodes.

use crate::context::MotionCtx;

/// Leaf and composite tick outcome.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Running,
    Success,
    Failure,
}

/// One node of the tree. Leaves do the work; composites order it.
pub trait Behavior {
    fn name(&self) -> &str;

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status;
}

/// Ticks children in order. Fails on the first failure, reports
/// `Running` from the first running child, succeeds when every child
/// succeeded. Children are re-ticked from the start every tick.
pub struct Sequence {
    name: String,
    children: Vec<Box<dyn Behavior>>,
}

impl Sequence {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Behavior>>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

impl Behavior for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        for child in &mut self.children {
            match child.tick(ctx) {
                Status::Success => continue,
                Status::Running => return Status::Running,
                Status::Failure => {
                    tracing::debug!(node = child.name(), "sequence child failed");
                    return Status::Failure;
                }
            }
        }
        Status::Success
    }
}

/// Ticks children in order until one succeeds.
pub struct Selector {
    name: String,
    children: Vec<Box<dyn Behavior>>,
}

impl Selector {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Behavior>>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

impl Behavior for Selector {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        for child in &mut self.children {
            match child.tick(ctx) {
                Status::Failure => continue,
                status => return status,
            }
        }
        Status::Failure
    }
}

/// Ticks every child every tick. Fails if any child failed, succeeds
/// when all succeeded, otherwise keeps running.
pub struct Parallel {
    name: String,
    children: Vec<Box<dyn Behavior>>,
}

impl Parallel {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Behavior>>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

impl Behavior for Parallel {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, ctx: &mut MotionCtx) -> Status {
        let mut all_success = true;
        let mut any_failure = false;
        for child in &mut self.children {
            match child.tick(ctx) {
                Status::Success => {}
                Status::Running => all_success = false,
                Status::Failure => {
                    any_failure = true;
                    all_success = false;
                }
            }
        }
        if any_failure {
            Status::Failure
        } else if all_success {
            Status::Success
        } else {
            Status::Running
        }
    }
}
