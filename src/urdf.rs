//! Robot description (URDF) reader.
//!
//! Only the parts the overlay depends on are kept: link names, whether each
//! link has collision geometry, and the joint graph with its frames and limits.

use crate::error::Result;
use crate::model::{JointLimit, JointType};
use crate::xml::{DescriptionKind, XmlCursor};
use glam::{EulerRot, Quat, Vec3};
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A parsed and validated robot description.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RobotDescription {
    pub name: String,
    pub links: Vec<LinkDescription>,
    pub joints: Vec<JointDescription>,
}

impl RobotDescription {
    pub fn link(&self, name: &str) -> Option<&LinkDescription> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn joint(&self, name: &str) -> Option<&JointDescription> {
        self.joints.iter().find(|j| j.name == name)
    }

    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.name.as_str())
    }

    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(|j| j.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkDescription {
    pub name: String,
    /// At least one `<collision>` element was present.
    pub has_collision: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JointDescription {
    pub name: String,
    pub joint_type: JointType,
    pub parent: String,
    pub child: String,
    /// `<origin>`: position and rotation of the joint frame in the parent frame.
    pub origin: (Vec3, Quat),
    /// `<axis>`, normalized. URDF defaults to `+X`.
    pub axis: Vec3,
    pub limits: Option<JointLimit>,
}

/// Parses URDF text into a [`RobotDescription`].
///
/// # Errors
///
/// Returns [`OverlayError::MalformedRobotDescription`](crate::OverlayError)
/// if the XML is malformed, required elements or attributes are missing, a
/// joint type is unknown, names are duplicated, or a joint references an
/// undeclared link.
pub fn parse_robot_text(text: &str) -> Result<RobotDescription> {
    let mut cursor = XmlCursor::new(text, DescriptionKind::Robot);
    let mut buf = Vec::new();
    let mut robot: Option<RobotDescription> = None;

    loop {
        match cursor.next(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.name().as_ref() == b"robot" && robot.is_some() =>
            {
                return Err(cursor.error("multiple <robot> elements"));
            }
            Event::Start(ref e) if e.name().as_ref() == b"robot" => {
                robot = Some(parse_robot(&mut cursor, e)?);
            }
            Event::Empty(ref e) if e.name().as_ref() == b"robot" => {
                robot = Some(RobotDescription {
                    name: cursor.attribute(e, "name")?,
                    ..Default::default()
                });
            }
            Event::Start(ref e) => {
                let name = e.name().as_ref().to_vec();
                cursor.skip(&name)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let robot = robot.ok_or_else(|| cursor.error_unlocated("missing required element <robot>"))?;
    validate(&cursor, &robot)?;
    Ok(robot)
}

fn parse_robot(cursor: &mut XmlCursor<'_>, start: &BytesStart) -> Result<RobotDescription> {
    let mut robot = RobotDescription {
        name: cursor.attribute(start, "name")?,
        ..Default::default()
    };
    let mut buf = Vec::new();

    loop {
        match cursor.next(&mut buf)? {
            Event::Start(ref e) => {
                let elem_name = e.name().as_ref().to_vec();
                match elem_name.as_slice() {
                    b"link" => robot.links.push(parse_link(cursor, e)?),
                    b"joint" => robot.joints.push(parse_joint(cursor, e, false)?),
                    // material, gazebo, transmission, ...
                    _ => cursor.skip(&elem_name)?,
                }
            }
            Event::Empty(ref e) => match e.name().as_ref() {
                b"link" => robot.links.push(LinkDescription {
                    name: cursor.attribute(e, "name")?,
                    has_collision: false,
                }),
                b"joint" => robot.joints.push(parse_joint(cursor, e, true)?),
                _ => {}
            },
            Event::End(ref e) if e.name().as_ref() == b"robot" => break,
            Event::Eof => return Err(cursor.unterminated("robot")),
            _ => {}
        }
    }

    Ok(robot)
}

fn parse_link(cursor: &mut XmlCursor<'_>, start: &BytesStart) -> Result<LinkDescription> {
    let mut link = LinkDescription {
        name: cursor.attribute(start, "name")?,
        has_collision: false,
    };
    let mut buf = Vec::new();

    loop {
        match cursor.next(&mut buf)? {
            Event::Start(ref e) => {
                let elem_name = e.name().as_ref().to_vec();
                if elem_name == b"collision" {
                    link.has_collision = true;
                }
                cursor.skip(&elem_name)?;
            }
            Event::Empty(ref e) if e.name().as_ref() == b"collision" => {
                link.has_collision = true;
            }
            Event::End(ref e) if e.name().as_ref() == b"link" => break,
            Event::Eof => return Err(cursor.unterminated("link")),
            _ => {}
        }
    }

    Ok(link)
}

fn parse_joint(
    cursor: &mut XmlCursor<'_>,
    start: &BytesStart,
    is_empty: bool,
) -> Result<JointDescription> {
    let name = cursor.attribute(start, "name")?;
    let type_name = cursor.attribute(start, "type")?;
    let joint_type = JointType::from_urdf(&type_name)
        .ok_or_else(|| cursor.error(format!("unknown joint type '{type_name}' on joint '{name}'")))?;

    let mut parent = None;
    let mut child = None;
    let mut origin = (Vec3::ZERO, Quat::IDENTITY);
    let mut axis = Vec3::X;
    let mut limits = None;
    let mut buf = Vec::new();

    while !is_empty {
        let (e, has_children) = match cursor.next(&mut buf)? {
            Event::Start(e) => (e.into_owned(), true),
            Event::Empty(e) => (e.into_owned(), false),
            Event::End(ref e) if e.name().as_ref() == b"joint" => break,
            Event::Eof => return Err(cursor.unterminated("joint")),
            _ => continue,
        };
        match e.name().as_ref() {
            b"parent" => parent = Some(cursor.attribute(&e, "link")?),
            b"child" => child = Some(cursor.attribute(&e, "link")?),
            b"origin" => origin = parse_origin(cursor, &e)?,
            b"axis" => {
                if let Some(xyz) = cursor.attribute_opt(&e, "xyz")? {
                    axis = parse_vec3(cursor, &xyz, "axis xyz")?.normalize_or(Vec3::Z);
                }
            }
            b"limit" => limits = Some(parse_limit(cursor, &e)?),
            // dynamics, mimic, calibration, safety_controller
            _ => {}
        }
        if has_children {
            cursor.skip(e.name().as_ref())?;
        }
    }

    let missing = |what: &str| cursor.error(format!("joint '{name}' has no <{what}> link"));
    let parent = parent.ok_or_else(|| missing("parent"))?;
    let child = child.ok_or_else(|| missing("child"))?;

    Ok(JointDescription {
        name,
        joint_type,
        parent,
        child,
        origin,
        axis,
        limits,
    })
}

fn parse_origin(cursor: &XmlCursor<'_>, e: &BytesStart) -> Result<(Vec3, Quat)> {
    let xyz = match cursor.attribute_opt(e, "xyz")? {
        Some(s) => parse_vec3(cursor, &s, "origin xyz")?,
        None => Vec3::ZERO,
    };
    let rpy = match cursor.attribute_opt(e, "rpy")? {
        Some(s) => parse_vec3(cursor, &s, "origin rpy")?,
        None => Vec3::ZERO,
    };
    // Fixed-axis roll, pitch, yaw: R = Rz(yaw) * Ry(pitch) * Rx(roll).
    let rotation = Quat::from_euler(EulerRot::ZYX, rpy.z, rpy.y, rpy.x);
    Ok((xyz, rotation))
}

fn parse_limit(cursor: &XmlCursor<'_>, e: &BytesStart) -> Result<JointLimit> {
    let float = |name: &str| -> Result<f32> {
        match cursor.attribute_opt(e, name)? {
            Some(s) => s
                .trim()
                .parse()
                .map_err(|_| cursor.error(format!("invalid value '{s}' for limit {name}"))),
            None => Ok(0.0),
        }
    };
    Ok(JointLimit {
        min: float("lower")?,
        max: float("upper")?,
        effort: float("effort")?,
        velocity: float("velocity")?,
    })
}

fn parse_vec3(cursor: &XmlCursor<'_>, value: &str, what: &str) -> Result<Vec3> {
    let parts = cursor.floats(value, what)?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(cursor.error(format!(
            "expected 3 values for {what}, got {}: '{value}'",
            parts.len()
        ))),
    }
}

/// Checks name uniqueness and that every joint references declared links.
fn validate(cursor: &XmlCursor<'_>, robot: &RobotDescription) -> Result<()> {
    let mut links = HashSet::new();
    for link in &robot.links {
        if !links.insert(link.name.as_str()) {
            return Err(cursor.error_unlocated(format!("duplicate link name '{}'", link.name)));
        }
    }

    let mut joints = HashSet::new();
    for joint in &robot.joints {
        if !joints.insert(joint.name.as_str()) {
            return Err(cursor.error_unlocated(format!("duplicate joint name '{}'", joint.name)));
        }
        for link in [&joint.parent, &joint.child] {
            if !links.contains(link.as_str()) {
                return Err(cursor.error_unlocated(format!(
                    "joint '{}' references undefined link '{link}'",
                    joint.name
                )));
            }
        }
    }

    tracing::debug!(
        "robot description '{}': {} links, {} joints",
        robot.name,
        robot.links.len(),
        robot.joints.len()
    );
    Ok(())
}
