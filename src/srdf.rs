//! Semantic description (SRDF) reader.
//!
//! Reads `<disable_collisions>`, `<group_state>` and `<passive_joint>`;
//! everything else in the document is skipped.

use crate::error::Result;
use crate::model::JointValue;
use crate::pair::{BodyName, CollisionPair};
use crate::xml::{DescriptionKind, XmlCursor};
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};

/// A parsed semantic description.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticDescription {
    /// The robot this description targets.
    pub robot_name: String,
    /// `<disable_collisions>` declarations, in document order.
    pub disabled_pairs: Vec<DisabledPairSpec>,
    /// `<group_state>` declarations, in document order.
    pub group_states: Vec<GroupState>,
    pub passive_joints: Vec<String>,
}

/// One `<disable_collisions link1=".." link2=".." reason=".."/>` declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledPairSpec {
    pub link1: BodyName,
    pub link2: BodyName,
    pub reason: Option<DisableReason>,
}

impl DisabledPairSpec {
    pub fn new(link1: impl Into<BodyName>, link2: impl Into<BodyName>) -> Self {
        Self {
            link1: link1.into(),
            link2: link2.into(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: DisableReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// The declared pair, or `None` for a self-pair.
    pub fn pair(&self) -> Option<CollisionPair> {
        CollisionPair::new(self.link1.clone(), self.link2.clone())
    }
}

/// Why a pair was disabled, as recorded by the tool that wrote the SRDF.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisableReason {
    /// The links are connected by a joint.
    Adjacent,
    /// Sampling never found the links in collision.
    Never,
    /// The links collide in the default configuration.
    Default,
    /// Set by hand.
    User,
    Other(String),
}

impl DisableReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "Adjacent" => Self::Adjacent,
            "Never" => Self::Never,
            "Default" => Self::Default,
            "User" => Self::User,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One `<group_state name=".." group="..">` with its joint values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    pub name: String,
    pub group: String,
    pub joints: Vec<JointValue>,
}

/// Parses SRDF text into a [`SemanticDescription`].
///
/// # Errors
///
/// Returns [`OverlayError::MalformedSemanticDescription`](crate::OverlayError)
/// if the XML is malformed or unterminated, the `<robot>` element is
/// missing, or a declaration lacks a required attribute.
pub fn parse_semantic_text(text: &str) -> Result<SemanticDescription> {
    let mut cursor = XmlCursor::new(text, DescriptionKind::Semantic);
    let mut buf = Vec::new();
    let mut semantic: Option<SemanticDescription> = None;

    loop {
        match cursor.next(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.name().as_ref() == b"robot" && semantic.is_some() =>
            {
                return Err(cursor.error("multiple <robot> elements"));
            }
            Event::Start(ref e) if e.name().as_ref() == b"robot" => {
                semantic = Some(parse_robot(&mut cursor, e)?);
            }
            Event::Empty(ref e) if e.name().as_ref() == b"robot" => {
                semantic = Some(SemanticDescription {
                    robot_name: cursor.attribute(e, "name")?,
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

    let semantic =
        semantic.ok_or_else(|| cursor.error_unlocated("missing required element <robot>"))?;
    tracing::debug!(
        "semantic description '{}': {} disabled pairs, {} group states",
        semantic.robot_name,
        semantic.disabled_pairs.len(),
        semantic.group_states.len()
    );
    Ok(semantic)
}

fn parse_robot(cursor: &mut XmlCursor<'_>, start: &BytesStart) -> Result<SemanticDescription> {
    let mut semantic = SemanticDescription {
        robot_name: cursor.attribute(start, "name")?,
        ..Default::default()
    };
    let mut buf = Vec::new();

    loop {
        let (e, has_children) = match cursor.next(&mut buf)? {
            Event::Start(e) => (e.into_owned(), true),
            Event::Empty(e) => (e.into_owned(), false),
            Event::End(ref e) if e.name().as_ref() == b"robot" => break,
            Event::Eof => return Err(cursor.unterminated("robot")),
            _ => continue,
        };

        match e.name().as_ref() {
            b"disable_collisions" => {
                semantic.disabled_pairs.push(parse_disable_collisions(cursor, &e)?);
                if has_children {
                    cursor.skip(b"disable_collisions")?;
                }
            }
            b"group_state" => {
                let state = parse_group_state(cursor, &e, has_children)?;
                semantic.group_states.push(state);
            }
            b"passive_joint" => {
                semantic.passive_joints.push(cursor.attribute(&e, "name")?);
                if has_children {
                    cursor.skip(b"passive_joint")?;
                }
            }
            // group, end_effector, virtual_joint, link_sphere_approximations, ...
            other => {
                if has_children {
                    let other = other.to_vec();
                    cursor.skip(&other)?;
                }
            }
        }
    }

    Ok(semantic)
}

fn parse_disable_collisions(cursor: &XmlCursor<'_>, e: &BytesStart) -> Result<DisabledPairSpec> {
    Ok(DisabledPairSpec {
        link1: cursor.attribute(e, "link1")?,
        link2: cursor.attribute(e, "link2")?,
        reason: cursor
            .attribute_opt(e, "reason")?
            .map(|r| DisableReason::parse(&r)),
    })
}

fn parse_group_state(
    cursor: &mut XmlCursor<'_>,
    start: &BytesStart,
    has_children: bool,
) -> Result<GroupState> {
    let mut state = GroupState {
        name: cursor.attribute(start, "name")?,
        group: cursor.attribute(start, "group")?,
        joints: Vec::new(),
    };
    let mut buf = Vec::new();

    while has_children {
        let (e, nested) = match cursor.next(&mut buf)? {
            Event::Start(e) => (e.into_owned(), true),
            Event::Empty(e) => (e.into_owned(), false),
            Event::End(ref e) if e.name().as_ref() == b"group_state" => break,
            Event::Eof => return Err(cursor.unterminated("group_state")),
            _ => continue,
        };
        if e.name().as_ref() == b"joint" {
            let joint = cursor.attribute(&e, "name")?;
            let value = cursor.attribute(&e, "value")?;
            let values = cursor.floats(&value, &format!("joint '{joint}'"))?;
            if values.is_empty() {
                return Err(cursor.error(format!(
                    "joint '{joint}' in group state '{}' has no value",
                    state.name
                )));
            }
            state.joints.push(JointValue {
                joint,
                values,
            });
        }
        if nested {
            cursor.skip(e.name().as_ref())?;
        }
    }

    Ok(state)
}
