//! The world body store and its synchronous update service.

use indexmap::IndexMap;
use nalgebra::Isometry3;

use crate::{BodyShape, Result, WorldBody, WorldError};

/// One body with its pose and attachment state.
#[derive(Clone, Debug)]
pub struct BodyState {
    pub body: WorldBody,
    /// World pose for free bodies; pose in the attachment link's frame
    /// for attached ones.
    pub pose: Isometry3<f64>,
    /// Link the body is rigidly attached to, if any. The transform is
    /// frozen relative to that link until detached.
    pub attached_to: Option<String>,
}

/// Update operations, mirroring the external service surface.
#[derive(Clone, Debug)]
pub enum WorldOp {
    Add {
        body: WorldBody,
        pose: Isometry3<f64>,
        rigidly_attached: bool,
        /// Attachment link; required when `rigidly_attached`.
        frame_id: Option<String>,
    },
    Remove {
        name: String,
    },
    RemoveAll,
    Detach {
        name: String,
    },
}

/// World body store. Owned by the executive; queried by the collision
/// module every tick.
#[derive(Clone, Debug, Default)]
pub struct World {
    bodies: IndexMap<String, BodyState>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update operation. Failures leave the world unchanged.
    pub fn apply(&mut self, op: WorldOp) -> Result<()> {
        match op {
            WorldOp::Add {
                body,
                pose,
                rigidly_attached,
                frame_id,
            } => self.add(body, pose, rigidly_attached, frame_id),
            WorldOp::Remove { name } => self.remove(&name),
            WorldOp::RemoveAll => {
                tracing::debug!(count = self.bodies.len(), "clearing world");
                self.bodies.clear();
                Ok(())
            }
            WorldOp::Detach { name } => self.detach(&name),
        }
    }

    fn add(
        &mut self,
        body: WorldBody,
        pose: Isometry3<f64>,
        rigidly_attached: bool,
        frame_id: Option<String>,
    ) -> Result<()> {
        if self.bodies.contains_key(&body.name) {
            return Err(WorldError::DuplicateBody(body.name));
        }
        match &body.shape {
            BodyShape::Primitive(p) if !p.is_well_formed() => {
                return Err(WorldError::CorruptShape(body.name));
            }
            BodyShape::Mesh { resource } if resource.is_empty() => {
                return Err(WorldError::CorruptShape(body.name));
            }
            BodyShape::Urdf { .. } => {
                return Err(WorldError::UnknownBody(body.name));
            }
            _ => {}
        }
        let attached_to = if rigidly_attached {
            match frame_id {
                Some(frame) => Some(frame),
                None => return Err(WorldError::UnknownBody(body.name)),
            }
        } else {
            None
        };

        tracing::info!(name = %body.name, attached = attached_to.is_some(), "adding body");
        self.bodies.insert(
            body.name.clone(),
            BodyState {
                body,
                pose,
                attached_to,
            },
        );
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.bodies
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| WorldError::MissingBody(name.to_owned()))
    }

    fn detach(&mut self, name: &str) -> Result<()> {
        let state = self
            .bodies
            .get_mut(name)
            .ok_or_else(|| WorldError::MissingBody(name.to_owned()))?;
        if state.attached_to.is_none() {
            return Err(WorldError::UnknownBody(name.to_owned()));
        }
        state.attached_to = None;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&BodyState> {
        self.bodies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bodies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BodyState)> {
        self.bodies.iter().map(|(k, v)| (k.as_str(), v))
    }
}
