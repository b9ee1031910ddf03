//! Property-based tests for collision pair resolution.

use glam::{Quat, Vec3};
use proptest::prelude::*;
use srdf_overlay::{
    Body, CandidatePolicy, CollisionPairResolver, DisabledPairSpec, JointDefinition, JointType,
    KinematicModel, RobotModel, SemanticApplier, register_pairs,
};

fn body_name(i: usize) -> String {
    format!("link_{i}")
}

/// `link_0 -> link_1 -> ... -> link_{count-1}`, one revolute joint per link.
fn chain(count: usize) -> RobotModel {
    let mut model = RobotModel::new("chain");
    let mut parent = None;
    for i in 0..count {
        let child = model.add_body(Body::new(body_name(i)));
        if let Some(parent) = parent {
            model.add_joint(JointDefinition {
                name: format!("joint_{i}"),
                parent,
                child,
                joint_type: JointType::Revolute,
                origin: (Vec3::X, Quat::IDENTITY),
                axis: Vec3::Z,
                limits: None,
            });
        }
        parent = Some(child);
    }
    model
}

/// A body count and a list of declarations over bodies `0..count + 2`, so
/// some declarations name bodies the model does not have.
fn declarations() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..9).prop_flat_map(|count| {
        (
            Just(count),
            prop::collection::vec((0..count + 2, 0..count + 2), 0..24),
        )
    })
}

fn specs(pairs: &[(usize, usize)]) -> Vec<DisabledPairSpec> {
    pairs
        .iter()
        .map(|&(a, b)| DisabledPairSpec::new(body_name(a), body_name(b)))
        .collect()
}

proptest! {
    #[test]
    fn added_and_disabled_partition_candidates((count, pairs) in declarations()) {
        let model = chain(count);
        let resolution = CollisionPairResolver::default().resolve(&model, &specs(&pairs));

        prop_assert_eq!(resolution.candidates.len(), count * (count - 1) / 2);
        prop_assert_eq!(
            resolution.added.len() + resolution.disabled.len(),
            resolution.candidates.len()
        );
        for pair in &resolution.added {
            prop_assert!(resolution.candidates.contains(pair));
            prop_assert!(!resolution.disabled.contains(pair));
        }
        for pair in &resolution.disabled {
            prop_assert!(resolution.candidates.contains(pair));
        }
    }

    #[test]
    fn declaration_order_within_pair_is_irrelevant((count, pairs) in declarations()) {
        let model = chain(count);
        let swapped: Vec<_> = pairs.iter().map(|&(a, b)| (b, a)).collect();
        let resolver = CollisionPairResolver::default();

        let forward = resolver.resolve(&model, &specs(&pairs));
        let backward = resolver.resolve(&model, &specs(&swapped));

        prop_assert_eq!(forward.added.as_slice(), backward.added.as_slice());
        prop_assert_eq!(forward.disabled.len(), backward.disabled.len());
        for pair in &forward.disabled {
            prop_assert!(backward.disabled.contains(pair));
        }
    }

    #[test]
    fn repeated_declarations_change_nothing((count, pairs) in declarations()) {
        let model = chain(count);
        let mut doubled = pairs.clone();
        doubled.extend(pairs.iter().copied());
        let resolver = CollisionPairResolver::default();

        let once = resolver.resolve(&model, &specs(&pairs));
        let twice = resolver.resolve(&model, &specs(&doubled));

        prop_assert_eq!(once.added, twice.added);
        prop_assert_eq!(once.disabled, twice.disabled);
    }

    #[test]
    fn self_pairs_never_appear((count, pairs) in declarations()) {
        let model = chain(count);
        let resolution = CollisionPairResolver::default().resolve(&model, &specs(&pairs));

        for pair in resolution.added.iter().chain(resolution.disabled.iter()) {
            prop_assert_ne!(pair.first(), pair.second());
        }
    }

    #[test]
    fn unknown_bodies_only_produce_diagnostics((count, pairs) in declarations()) {
        let model = chain(count);
        let resolution = CollisionPairResolver::default().resolve(&model, &specs(&pairs));

        let known: Vec<&str> = model.body_names();
        for pair in &resolution.disabled {
            prop_assert!(known.contains(&pair.first()));
            prop_assert!(known.contains(&pair.second()));
        }
        let expected_diagnostics: usize = pairs
            .iter()
            .map(|&(a, b)| match (a == b, a < count, b < count) {
                (true, _, _) => 1,
                (false, ka, kb) => usize::from(!ka) + usize::from(!kb),
            })
            .sum();
        prop_assert_eq!(resolution.diagnostics.len(), expected_diagnostics);
    }

    #[test]
    fn skip_adjacent_never_adds_jointed_pairs((count, pairs) in declarations()) {
        let model = chain(count);
        let resolution =
            CollisionPairResolver::new(CandidatePolicy::SkipAdjacent).resolve(&model, &specs(&pairs));

        let adjacent = model.adjacent_bodies();
        prop_assert_eq!(adjacent.len(), count - 1);
        for (parent, child) in adjacent {
            prop_assert!(!resolution.is_added(parent, child));
            prop_assert!(!resolution.candidates.contains_bodies(parent, child));
        }
        prop_assert_eq!(
            resolution.candidates.len(),
            count * (count - 1) / 2 - (count - 1)
        );
        for pair in &resolution.added {
            prop_assert!(resolution.candidates.contains(pair));
            prop_assert!(!resolution.disabled.contains(pair));
        }
    }

    #[test]
    fn registration_matches_added((count, pairs) in declarations(), skip in any::<bool>()) {
        let policy = if skip { CandidatePolicy::SkipAdjacent } else { CandidatePolicy::AllPairs };
        let mut model = chain(count);
        let resolution = CollisionPairResolver::new(policy).resolve(&model, &specs(&pairs));

        let failures = register_pairs(&resolution.added, &mut model);

        prop_assert!(failures.is_empty());
        prop_assert_eq!(model.collision_pairs(), &resolution.added);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn applying_twice_is_deterministic((count, pairs) in declarations()) {
        let links: String = (0..count)
            .map(|i| format!("<link name=\"{}\"/>", body_name(i)))
            .collect();
        let robot = format!("<robot name=\"chain\">{links}</robot>");
        let disabled: String = pairs
            .iter()
            .map(|&(a, b)| {
                format!(
                    "<disable_collisions link1=\"{}\" link2=\"{}\"/>",
                    body_name(a),
                    body_name(b)
                )
            })
            .collect();
        let semantic = format!("<robot name=\"chain\">{disabled}</robot>");
        let applier = SemanticApplier::default();

        let mut first_model = chain(count);
        let mut second_model = chain(count);
        let first = applier.parse_stream(&robot, &semantic, &mut first_model);
        let second = applier.parse_stream(&robot, &semantic, &mut second_model);

        prop_assert_eq!(first.ok(), second.ok());
        prop_assert_eq!(
            first_model.collision_pairs().as_slice(),
            second_model.collision_pairs().as_slice()
        );
    }
}
