//! # srdf-overlay
//!
//! Applies a robot's *semantic* description (SRDF) to a kinematic model that
//! has already been built from its robot description (URDF).
//!
//! The core is collision pair resolution: every pair of distinct bodies is a
//! candidate for collision checking, the semantic description's
//! `<disable_collisions>` declarations are subtracted, and the remaining pairs
//! are registered on the model. The disabled and added pairs are kept in a
//! [`ParseResult`] for auditing, together with named configurations and any
//! recoverable [`Diagnostic`]s.
//!
//! The model is reached only through the [`KinematicModel`] trait and by body
//! name, so any kinematic graph can be overlaid; [`RobotModel`] is the
//! in-crate implementation.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod applier;
pub mod error;
pub mod locator;
pub mod model;
pub mod pair;
pub mod report;
pub mod resolver;
pub mod srdf;
pub mod urdf;
mod xml;

pub use applier::*;
pub use error::*;
pub use locator::*;
pub use model::*;
pub use pair::*;
pub use resolver::*;
pub use srdf::*;
pub use urdf::*;
