//! Applies a semantic description to an already-built robot model.
//!
//! The entry point is [`SemanticApplier`]. Configure it with an
//! [`OverlayConfig`], optionally swap its retriever with
//! [`SemanticApplier::with_retriever`], then call [`SemanticApplier::parse`]
//! with two locators or [`SemanticApplier::parse_stream`] with two texts.

use crate::error::{Diagnostic, Result};
use crate::locator::{DescriptionLoader, LocalRetriever, RawDescriptions, ResourceRetriever};
use crate::model::{KinematicModel, NamedConfiguration};
use crate::pair::PairSet;
use crate::resolver::{CandidatePolicy, CollisionPairResolver, register_pairs};
use crate::srdf::{GroupState, SemanticDescription, parse_semantic_text};
use crate::urdf::{RobotDescription, parse_robot_text};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for applying semantic descriptions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Which body pairs are eligible for collision checking. Default: all pairs.
    pub candidate_policy: CandidatePolicy,
    /// Register `<group_state>` configurations on the model. Default: true.
    pub register_configurations: bool,
    /// Report a diagnostic when the two descriptions name different robots.
    /// Default: true.
    pub check_robot_name: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            candidate_policy: CandidatePolicy::AllPairs,
            register_configurations: true,
            check_robot_name: true,
        }
    }
}

/// Everything one parse produced.
///
/// A successful parse may still carry [`diagnostics`](Self::diagnostics);
/// check both.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Name from the robot description.
    pub robot_name: String,
    /// Pairs excluded from collision checking, in declaration order.
    pub disabled: PairSet,
    /// Pairs registered on the model, in enumeration order.
    pub added: PairSet,
    /// Named configurations that were resolved against the model.
    pub configurations: Vec<NamedConfiguration>,
    /// Passive joints the model knows about.
    pub passive_joints: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Whether the pair `{a, b}` was disabled by the semantic description.
    pub fn is_disabled(&self, a: &str, b: &str) -> bool {
        self.disabled.contains_bodies(a, b)
    }

    /// Whether the pair `{a, b}` was added to the model.
    pub fn is_added(&self, a: &str, b: &str) -> bool {
        self.added.contains_bodies(a, b)
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn configuration(&self, name: &str) -> Option<&NamedConfiguration> {
        self.configurations.iter().find(|c| c.name == name)
    }
}

/// Loads, parses and applies semantic descriptions.
///
/// The applier keeps no per-call state: every call returns its own
/// [`ParseResult`], and the model is only touched once both descriptions have
/// parsed successfully.
pub struct SemanticApplier {
    config: OverlayConfig,
    retriever: Box<dyn ResourceRetriever>,
}

impl SemanticApplier {
    /// Creates an applier whose retriever searches [`ROS_PACKAGE_PATH`](crate::PACKAGE_PATH_VAR).
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            retriever: Box::new(LocalRetriever::from_env()),
        }
    }

    /// Replaces the resource retriever (builder pattern).
    pub fn with_retriever(mut self, retriever: impl ResourceRetriever + 'static) -> Self {
        self.retriever = Box::new(retriever);
        self
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Retrieves both descriptions and applies them to `model`.
    ///
    /// # Errors
    ///
    /// Fails with [`OverlayError::Retrieval`](crate::OverlayError::Retrieval)
    /// if a locator cannot be resolved, or with a `Malformed*` error if a
    /// description does not parse. The model is untouched on error.
    pub fn parse(
        &self,
        robot_locator: &str,
        semantic_locator: &str,
        model: &mut impl KinematicModel,
    ) -> Result<ParseResult> {
        let raw = DescriptionLoader::new(self.retriever.as_ref())
            .load_by_locator(robot_locator, semantic_locator)?;
        self.apply(&raw, model)
    }

    /// Applies already-fetched description texts to `model`.
    ///
    /// # Errors
    ///
    /// Fails with a `Malformed*` error if a description does not parse. The
    /// model is untouched on error.
    pub fn parse_stream(
        &self,
        robot_text: &str,
        semantic_text: &str,
        model: &mut impl KinematicModel,
    ) -> Result<ParseResult> {
        let raw = DescriptionLoader::load_from_text(robot_text, semantic_text);
        self.apply(&raw, model)
    }

    fn apply(&self, raw: &RawDescriptions, model: &mut impl KinematicModel) -> Result<ParseResult> {
        // Both parses must succeed before anything is registered.
        let robot = parse_robot_text(&raw.robot)?;
        let semantic = parse_semantic_text(&raw.semantic)?;

        let mut diagnostics = Vec::new();
        if self.config.check_robot_name && robot.name != semantic.robot_name {
            tracing::warn!(
                "semantic description is for '{}', robot description is '{}'",
                semantic.robot_name,
                robot.name
            );
            diagnostics.push(Diagnostic::RobotNameMismatch {
                robot: robot.name.clone(),
                semantic: semantic.robot_name.clone(),
            });
        }

        let resolution = CollisionPairResolver::new(self.config.candidate_policy)
            .resolve(&*model, &semantic.disabled_pairs);
        diagnostics.extend(resolution.diagnostics);

        let known_joints: HashSet<String> =
            model.joint_names().into_iter().map(str::to_string).collect();
        let configurations =
            resolve_configurations(&semantic.group_states, &known_joints, &mut diagnostics);
        let passive_joints = semantic
            .passive_joints
            .iter()
            .filter(|joint| {
                let known = known_joints.contains(*joint);
                if !known {
                    tracing::warn!("ignoring unknown passive joint '{}'", joint);
                }
                known
            })
            .cloned()
            .collect();

        diagnostics.extend(register_pairs(&resolution.added, model));
        if self.config.register_configurations {
            for configuration in &configurations {
                if let Err(source) = model.register_configuration(configuration) {
                    tracing::warn!(
                        "cannot register configuration '{}': {}",
                        configuration.name,
                        source
                    );
                    diagnostics.push(Diagnostic::ConfigurationRegistrationFailure {
                        configuration: configuration.name.clone(),
                        source,
                    });
                }
            }
        }

        log_summary(&robot, &semantic, &resolution.added, &diagnostics);

        Ok(ParseResult {
            robot_name: robot.name,
            disabled: resolution.disabled,
            added: resolution.added,
            configurations,
            passive_joints,
            diagnostics,
        })
    }
}

impl Default for SemanticApplier {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

/// Turns group states into configurations over known joints.
///
/// Unknown joints are dropped with a diagnostic; a repeated state name keeps
/// the first declaration.
fn resolve_configurations(
    states: &[GroupState],
    known_joints: &HashSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<NamedConfiguration> {
    let mut seen = HashSet::new();
    let mut configurations = Vec::new();

    for state in states {
        if !seen.insert(state.name.as_str()) {
            tracing::warn!("duplicate configuration '{}'", state.name);
            diagnostics.push(Diagnostic::DuplicateConfiguration(state.name.clone()));
            continue;
        }

        let mut joint_values = Vec::with_capacity(state.joints.len());
        for value in &state.joints {
            if known_joints.contains(&value.joint) {
                joint_values.push(value.clone());
            } else {
                tracing::warn!(
                    "configuration '{}' references unknown joint '{}'",
                    state.name,
                    value.joint
                );
                diagnostics.push(Diagnostic::UnknownJointReference {
                    configuration: state.name.clone(),
                    joint: value.joint.clone(),
                });
            }
        }

        configurations.push(NamedConfiguration {
            name: state.name.clone(),
            group: state.group.clone(),
            joint_values,
        });
    }

    configurations
}

fn log_summary(
    robot: &RobotDescription,
    semantic: &SemanticDescription,
    added: &PairSet,
    diagnostics: &[Diagnostic],
) {
    tracing::info!(
        "applied semantic description to '{}': {} pairs added, {} declarations, {} diagnostics",
        robot.name,
        added.len(),
        semantic.disabled_pairs.len(),
        diagnostics.len()
    );
}
