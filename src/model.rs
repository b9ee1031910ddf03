use crate::error::RegistrationError;
use crate::pair::{BodyName, CollisionPair, PairSet};
use crate::urdf::RobotDescription;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a body in a [`RobotModel`]'s arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyIndex(pub usize);

/// Index of a joint in a [`RobotModel`]'s arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JointIndex(pub usize);

/// What the overlay needs from a kinematic model.
///
/// The overlay only ever sees body and joint *names*; it never holds handles
/// into the model. [`RobotModel`] is the in-crate implementation.
pub trait KinematicModel {
    /// Body names, in a stable order. Candidate pairs are enumerated in this order.
    fn body_names(&self) -> Vec<&str>;

    /// `(parent, child)` body names of every joint.
    fn adjacent_bodies(&self) -> Vec<(&str, &str)>;

    fn joint_names(&self) -> Vec<&str>;

    /// Enables collision checking between two bodies.
    fn register_collision_pair(
        &mut self,
        first: &str,
        second: &str,
    ) -> Result<(), RegistrationError>;

    /// Stores a named configuration. Models without a configuration registry
    /// accept and drop it.
    fn register_configuration(
        &mut self,
        configuration: &NamedConfiguration,
    ) -> Result<(), RegistrationError> {
        let _ = configuration;
        Ok(())
    }
}

/// An arena-held kinematic graph of bodies connected by joints, plus the
/// registries the semantic overlay writes into.
///
/// Bodies and joints are addressed by [`BodyIndex`] / [`JointIndex`]; names
/// are unique within one model.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RobotModel {
    pub name: String,
    bodies: Vec<Body>,
    joints: Vec<JointDefinition>,
    body_lookup: HashMap<BodyName, BodyIndex>,
    joint_lookup: HashMap<String, JointIndex>,
    collision_pairs: PairSet,
    configurations: Vec<NamedConfiguration>,
}

impl RobotModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds the kinematic graph of a parsed robot description.
    ///
    /// Bodies keep the description's link order. Joints whose links are
    /// missing are skipped; a parsed description never has any.
    pub fn from_description(description: &RobotDescription) -> Self {
        let mut model = Self::new(description.name.clone());
        for link in &description.links {
            model.add_body(Body::new(link.name.clone()).with_collision(link.has_collision));
        }
        for joint in &description.joints {
            let (Some(parent), Some(child)) =
                (model.body_index(&joint.parent), model.body_index(&joint.child))
            else {
                continue;
            };
            model.add_joint(JointDefinition {
                name: joint.name.clone(),
                parent,
                child,
                joint_type: joint.joint_type,
                origin: joint.origin,
                axis: joint.axis,
                limits: joint.limits,
            });
        }
        model
    }

    /// Adds a body, returning its index. Adding an existing name returns the
    /// existing index and leaves the body unchanged.
    pub fn add_body(&mut self, body: Body) -> BodyIndex {
        if let Some(&index) = self.body_lookup.get(&body.name) {
            return index;
        }
        let index = BodyIndex(self.bodies.len());
        self.body_lookup.insert(body.name.clone(), index);
        self.bodies.push(body);
        index
    }

    /// Adds a joint and records it as the child body's parent joint.
    pub fn add_joint(&mut self, joint: JointDefinition) -> JointIndex {
        let index = JointIndex(self.joints.len());
        if let Some(child) = self.bodies.get_mut(joint.child.0) {
            child.parent_joint = Some(index);
        }
        self.joint_lookup.insert(joint.name.clone(), index);
        self.joints.push(joint);
        index
    }

    pub fn body_index(&self, name: &str) -> Option<BodyIndex> {
        self.body_lookup.get(name).copied()
    }

    pub fn body(&self, index: BodyIndex) -> Option<&Body> {
        self.bodies.get(index.0)
    }

    pub fn body_by_name(&self, name: &str) -> Option<&Body> {
        self.body_index(name).and_then(|i| self.body(i))
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn joint(&self, index: JointIndex) -> Option<&JointDefinition> {
        self.joints.get(index.0)
    }

    pub fn joint_by_name(&self, name: &str) -> Option<&JointDefinition> {
        self.joint_lookup.get(name).and_then(|&i| self.joint(i))
    }

    pub fn joints(&self) -> &[JointDefinition] {
        &self.joints
    }

    /// Every collision pair registered so far, in registration order.
    pub fn collision_pairs(&self) -> &PairSet {
        &self.collision_pairs
    }

    pub fn has_collision_pair(&self, a: &str, b: &str) -> bool {
        self.collision_pairs.contains_bodies(a, b)
    }

    pub fn configurations(&self) -> &[NamedConfiguration] {
        &self.configurations
    }

    pub fn configuration(&self, name: &str) -> Option<&NamedConfiguration> {
        self.configurations.iter().find(|c| c.name == name)
    }
}

impl KinematicModel for RobotModel {
    fn body_names(&self) -> Vec<&str> {
        self.bodies.iter().map(|b| b.name.as_str()).collect()
    }

    fn adjacent_bodies(&self) -> Vec<(&str, &str)> {
        self.joints
            .iter()
            .filter_map(|j| {
                let parent = self.body(j.parent)?;
                let child = self.body(j.child)?;
                Some((parent.name.as_str(), child.name.as_str()))
            })
            .collect()
    }

    fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    fn register_collision_pair(
        &mut self,
        first: &str,
        second: &str,
    ) -> Result<(), RegistrationError> {
        for name in [first, second] {
            if !self.body_lookup.contains_key(name) {
                return Err(RegistrationError::UnknownBody(name.to_string()));
            }
        }
        let pair = CollisionPair::new(first, second).ok_or_else(|| {
            RegistrationError::Rejected(format!("body '{first}' cannot collide with itself"))
        })?;
        self.collision_pairs.insert(pair);
        Ok(())
    }

    /// Replaces any configuration of the same name.
    fn register_configuration(
        &mut self,
        configuration: &NamedConfiguration,
    ) -> Result<(), RegistrationError> {
        if let Some(unknown) = configuration
            .joint_values
            .iter()
            .find(|v| !self.joint_lookup.contains_key(&v.joint))
        {
            return Err(RegistrationError::UnknownJoint(unknown.joint.clone()));
        }
        match self
            .configurations
            .iter_mut()
            .find(|c| c.name == configuration.name)
        {
            Some(existing) => *existing = configuration.clone(),
            None => self.configurations.push(configuration.clone()),
        }
        Ok(())
    }
}

/// A single rigid body (link) of the robot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub name: BodyName,

    /// The joint connecting this body to its parent; `None` for a root.
    pub parent_joint: Option<JointIndex>,

    /// Whether the description gave this body collision geometry.
    pub has_collision_geometry: bool,
}

impl Body {
    pub fn new(name: impl Into<BodyName>) -> Self {
        Self {
            name: name.into(),
            parent_joint: None,
            has_collision_geometry: false,
        }
    }

    pub fn with_collision(mut self, has_collision_geometry: bool) -> Self {
        self.has_collision_geometry = has_collision_geometry;
        self
    }
}

/// A kinematic connection between two bodies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JointDefinition {
    pub name: String,

    /// The parent body (the one closer to the root).
    pub parent: BodyIndex,

    /// The child body (the one attached to the parent).
    pub child: BodyIndex,

    pub joint_type: JointType,

    /// Joint frame (position, rotation) relative to the parent body.
    pub origin: (Vec3, Quat),

    /// The axis of rotation/translation in the joint frame.
    pub axis: Vec3,

    /// Physical limits of the joint.
    pub limits: Option<JointLimit>,
}

/// Types of mechanical joints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointType {
    /// Fixed connection (welded).
    Fixed,
    /// Rotates around a single axis within limits (e.g., knee, elbow).
    Revolute,
    /// Rotates around a single axis without limits (e.g., wheel).
    Continuous,
    /// Slides along a single axis (linear actuator).
    Prismatic,
    /// Free 6-DOF motion.
    Floating,
    /// Moves in a plane perpendicular to the axis.
    Planar,
}

impl JointType {
    /// Parses the URDF `type` attribute.
    pub fn from_urdf(value: &str) -> Option<Self> {
        match value {
            "fixed" => Some(Self::Fixed),
            "revolute" => Some(Self::Revolute),
            "continuous" => Some(Self::Continuous),
            "prismatic" => Some(Self::Prismatic),
            "floating" => Some(Self::Floating),
            "planar" => Some(Self::Planar),
            _ => None,
        }
    }
}

/// Limits for a joint's motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    /// Minimum angle (radians) or distance (meters).
    pub min: f32,
    /// Maximum angle (radians) or distance (meters).
    pub max: f32,
    /// Maximum torque (Nm) or force (N) the joint motor can apply.
    pub effort: f32,
    /// Maximum velocity (rad/s or m/s).
    pub velocity: f32,
}

/// A named robot configuration ("group state"), e.g. `home` or `tucked`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedConfiguration {
    pub name: String,
    /// The planning group the configuration belongs to.
    pub group: String,
    pub joint_values: Vec<JointValue>,
}

impl NamedConfiguration {
    pub fn value(&self, joint: &str) -> Option<&[f32]> {
        self.joint_values
            .iter()
            .find(|v| v.joint == joint)
            .map(|v| v.values.as_slice())
    }
}

/// The position of one joint; multi-DOF joints carry several values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointValue {
    pub joint: String,
    pub values: Vec<f32>,
}
