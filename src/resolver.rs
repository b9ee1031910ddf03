//! Collision pair resolution.
//!
//! A [`ResolutionPass`] walks four stages:
//!
//! 1. **Candidates**: every unordered pair of distinct model bodies, in body
//!    order, filtered by the [`CandidatePolicy`].
//! 2. **Disabled**: each [`DisabledPairSpec`] naming two known, distinct
//!    bodies, deduplicated symmetrically. Others become [`Diagnostic`]s.
//! 3. **Added**: candidates minus disabled, in candidate order.
//! 4. **Finalized**: the pass yields a [`Resolution`].
//!
//! Registration of the added pairs on a model is done separately by
//! [`register_pairs`] so the pass itself never mutates anything.

use crate::error::Diagnostic;
use crate::model::KinematicModel;
use crate::pair::{BodyName, CollisionPair, PairSet};
use crate::srdf::DisabledPairSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::marker::PhantomData;

/// Which body pairs are candidates for collision checking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidatePolicy {
    /// Every pair of distinct bodies.
    #[default]
    AllPairs,
    /// Every pair of distinct bodies except those directly joined by a joint.
    SkipAdjacent,
}

/// Progress of a [`ResolutionPass`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResolutionStage {
    Init,
    CandidatesEnumerated,
    DisabledApplied,
    Finalized,
}

/// Type-level markers for the stages of a [`ResolutionPass`].
pub mod stage {
    use super::ResolutionStage;

    pub trait Stage {
        const STAGE: ResolutionStage;
    }

    #[derive(Debug)]
    pub struct Init;
    #[derive(Debug)]
    pub struct CandidatesEnumerated;
    #[derive(Debug)]
    pub struct DisabledApplied;

    impl Stage for Init {
        const STAGE: ResolutionStage = ResolutionStage::Init;
    }

    impl Stage for CandidatesEnumerated {
        const STAGE: ResolutionStage = ResolutionStage::CandidatesEnumerated;
    }

    impl Stage for DisabledApplied {
        const STAGE: ResolutionStage = ResolutionStage::DisabledApplied;
    }
}

use stage::{CandidatesEnumerated, DisabledApplied, Init, Stage};

/// The outcome of one resolution pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// All pairs eligible for collision checking.
    pub candidates: PairSet,
    /// Pairs excluded by the semantic description.
    pub disabled: PairSet,
    /// Pairs to register: `candidates − disabled`.
    pub added: PairSet,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn is_disabled(&self, a: &str, b: &str) -> bool {
        self.disabled.contains_bodies(a, b)
    }

    pub fn is_added(&self, a: &str, b: &str) -> bool {
        self.added.contains_bodies(a, b)
    }
}

/// One run of the resolution algorithm over a model and a list of exclusions.
///
/// Each stage method consumes the pass and returns it in the next stage, so
/// stages cannot be skipped or repeated:
///
/// ```compile_fail
/// use srdf_overlay::{CandidatePolicy, ResolutionPass};
///
/// // Exclusions cannot be applied before candidates are enumerated.
/// let resolution = ResolutionPass::new(CandidatePolicy::AllPairs)
///     .apply_disabled(&[])
///     .finalize();
/// ```
#[derive(Debug)]
pub struct ResolutionPass<S = Init> {
    policy: CandidatePolicy,
    known: HashSet<BodyName>,
    candidates: PairSet,
    disabled: PairSet,
    diagnostics: Vec<Diagnostic>,
    stage: PhantomData<S>,
}

impl<S: Stage> ResolutionPass<S> {
    pub fn stage(&self) -> ResolutionStage {
        S::STAGE
    }

    fn advance<T: Stage>(self) -> ResolutionPass<T> {
        ResolutionPass {
            policy: self.policy,
            known: self.known,
            candidates: self.candidates,
            disabled: self.disabled,
            diagnostics: self.diagnostics,
            stage: PhantomData,
        }
    }
}

impl ResolutionPass<Init> {
    pub fn new(policy: CandidatePolicy) -> Self {
        Self {
            policy,
            known: HashSet::new(),
            candidates: PairSet::new(),
            disabled: PairSet::new(),
            diagnostics: Vec::new(),
            stage: PhantomData,
        }
    }

    /// Stage 1: enumerate candidate pairs from the model's bodies.
    pub fn enumerate_candidates(
        mut self,
        model: &impl KinematicModel,
    ) -> ResolutionPass<CandidatesEnumerated> {
        let mut bodies: Vec<&str> = Vec::new();
        for name in model.body_names() {
            if self.known.insert(name.to_string()) {
                bodies.push(name);
            }
        }

        let adjacent: PairSet = match self.policy {
            CandidatePolicy::AllPairs => PairSet::new(),
            CandidatePolicy::SkipAdjacent => model
                .adjacent_bodies()
                .into_iter()
                .filter_map(|(parent, child)| CollisionPair::new(parent, child))
                .collect(),
        };

        let n = bodies.len();
        self.candidates = PairSet::with_capacity(n * n.saturating_sub(1) / 2);
        for (i, first) in bodies.iter().enumerate() {
            for second in &bodies[i + 1..] {
                if let Some(pair) = CollisionPair::new(*first, *second)
                    && !adjacent.contains(&pair)
                {
                    self.candidates.insert(pair);
                }
            }
        }

        tracing::debug!(
            "{} candidate pairs over {} bodies ({:?})",
            self.candidates.len(),
            n,
            self.policy
        );
        self.advance()
    }
}

impl ResolutionPass<CandidatesEnumerated> {
    /// Stage 2: collect the declared exclusions that name known bodies.
    pub fn apply_disabled(mut self, specs: &[DisabledPairSpec]) -> ResolutionPass<DisabledApplied> {
        for declaration in specs {
            let Some(pair) = declaration.pair() else {
                tracing::warn!("ignoring disabled pair of '{}' with itself", declaration.link1);
                self.diagnostics.push(Diagnostic::SelfPairDeclaration {
                    body: declaration.link1.clone(),
                });
                continue;
            };

            let unknown: Vec<&BodyName> = [&declaration.link1, &declaration.link2]
                .into_iter()
                .filter(|name| !self.known.contains(*name))
                .collect();
            if !unknown.is_empty() {
                for body in unknown {
                    tracing::warn!(
                        "disabled pair {} references unknown body '{}'",
                        pair,
                        body
                    );
                    self.diagnostics.push(Diagnostic::UnknownBodyReference {
                        body: body.clone(),
                        first: declaration.link1.clone(),
                        second: declaration.link2.clone(),
                    });
                }
                continue;
            }

            self.disabled.insert(pair);
        }

        self.advance()
    }
}

impl ResolutionPass<DisabledApplied> {
    /// Stage 3 and 4: compute the added pairs and finish.
    pub fn finalize(self) -> Resolution {
        let added = self.candidates.difference(&self.disabled);
        tracing::debug!(
            "{} pairs added, {} disabled",
            added.len(),
            self.disabled.len()
        );

        Resolution {
            candidates: self.candidates,
            disabled: self.disabled,
            added,
            diagnostics: self.diagnostics,
        }
    }
}

/// Runs complete resolution passes with a fixed policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollisionPairResolver {
    policy: CandidatePolicy,
}

impl CollisionPairResolver {
    pub fn new(policy: CandidatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CandidatePolicy {
        self.policy
    }

    pub fn resolve(
        &self,
        model: &impl KinematicModel,
        specs: &[DisabledPairSpec],
    ) -> Resolution {
        ResolutionPass::new(self.policy)
            .enumerate_candidates(model)
            .apply_disabled(specs)
            .finalize()
    }
}

/// Registers every pair on `model`, continuing past failures.
///
/// Returns one [`Diagnostic::RegistrationFailure`] per rejected pair.
pub fn register_pairs(pairs: &PairSet, model: &mut impl KinematicModel) -> Vec<Diagnostic> {
    let mut failures = Vec::new();
    for pair in pairs {
        if let Err(source) = model.register_collision_pair(pair.first(), pair.second()) {
            tracing::warn!("cannot register collision pair {}: {}", pair, source);
            failures.push(Diagnostic::RegistrationFailure {
                pair: pair.clone(),
                source,
            });
        }
    }
    failures
}
