// tests/basic_overlay.rs
use srdf_overlay::{
    Body, CandidatePolicy, Diagnostic, KinematicModel, OverlayConfig, OverlayError, RobotModel,
    SemanticApplier, parse_robot_text, report,
};

const HUMANOID_URDF: &str = r#"
    <robot name="humanoid">
        <link name="torso"><collision><geometry><box size="0.3 0.2 0.5"/></geometry></collision></link>
        <link name="armL"/>
        <link name="armR"/>
        <joint name="shoulderL" type="revolute">
            <parent link="torso"/>
            <child link="armL"/>
            <origin xyz="0 0.15 0.2"/>
            <axis xyz="0 1 0"/>
            <limit lower="-1.57" upper="1.57" effort="20" velocity="1"/>
        </joint>
        <joint name="shoulderR" type="revolute">
            <parent link="torso"/>
            <child link="armR"/>
            <origin xyz="0 -0.15 0.2"/>
            <axis xyz="0 1 0"/>
            <limit lower="-1.57" upper="1.57" effort="20" velocity="1"/>
        </joint>
    </robot>
"#;

const HUMANOID_SRDF: &str = r#"
    <robot name="humanoid">
        <group name="arms"><joint name="shoulderL"/><joint name="shoulderR"/></group>
        <group_state name="home" group="arms">
            <joint name="shoulderL" value="0"/>
            <joint name="shoulderR" value="0"/>
        </group_state>
        <disable_collisions link1="armL" link2="armR" reason="Never"/>
    </robot>
"#;

fn setup() -> (SemanticApplier, RobotModel) {
    let description = parse_robot_text(HUMANOID_URDF).expect("humanoid urdf should parse");
    let model = RobotModel::from_description(&description);
    (SemanticApplier::new(OverlayConfig::default()), model)
}

#[test]
fn test_humanoid_overlay() {
    let (applier, mut model) = setup();

    let result = applier
        .parse_stream(HUMANOID_URDF, HUMANOID_SRDF, &mut model)
        .expect("should apply");

    // Candidates: torso-armL, torso-armR, armL-armR. armL-armR is disabled.
    assert_eq!(result.robot_name, "humanoid");
    assert_eq!(result.disabled.len(), 1);
    assert_eq!(result.added.len(), 2);
    assert!(result.is_disabled("armL", "armR"));
    assert!(result.is_disabled("armR", "armL"));
    assert!(result.is_added("torso", "armL"));
    assert!(result.is_added("armR", "torso"));
    assert!(!result.is_added("armL", "armR"));
    assert!(!result.has_diagnostics());

    // The model received exactly the added pairs.
    assert_eq!(model.collision_pairs(), &result.added);
    assert!(!model.has_collision_pair("armL", "armR"));

    // Named configuration was registered.
    let home = model.configuration("home").expect("home configuration");
    assert_eq!(home.value("shoulderL"), Some(&[0.0][..]));
    assert_eq!(result.configuration("home"), Some(home));
}

#[test]
fn test_reports() {
    let (applier, mut model) = setup();
    let result = applier
        .parse_stream(HUMANOID_URDF, HUMANOID_SRDF, &mut model)
        .expect("should apply");

    let mut disabled = Vec::new();
    report::write_disabled_pairs(&result, &mut disabled).expect("write");
    assert_eq!(String::from_utf8(disabled).expect("utf8"), "armL <-> armR\n");

    let mut added = Vec::new();
    report::write_added_pairs(&result, &mut added).expect("write");
    assert_eq!(
        String::from_utf8(added).expect("utf8"),
        "torso <-> armL\ntorso <-> armR\n"
    );
}

#[test]
fn test_malformed_semantic_leaves_model_untouched() {
    let (applier, mut model) = setup();
    let unterminated = r#"<robot name="humanoid"><disable_collisions link1="armL" link2="armR""#;

    let err = applier
        .parse_stream(HUMANOID_URDF, unterminated, &mut model)
        .expect_err("should fail");

    assert!(matches!(err, OverlayError::MalformedSemanticDescription { .. }));
    assert!(model.collision_pairs().is_empty());
    assert!(model.configurations().is_empty());
}

#[test]
fn test_malformed_robot_fails_first() {
    let (applier, mut model) = setup();
    let err = applier
        .parse_stream("<robot name=\"humanoid\">", HUMANOID_SRDF, &mut model)
        .expect_err("should fail");
    assert!(matches!(err, OverlayError::MalformedRobotDescription { .. }));
    assert!(model.collision_pairs().is_empty());
}

#[test]
fn test_determinism() {
    let (applier, mut first_model) = setup();
    let (_, mut second_model) = setup();

    let first = applier
        .parse_stream(HUMANOID_URDF, HUMANOID_SRDF, &mut first_model)
        .expect("first run");
    let second = applier
        .parse_stream(HUMANOID_URDF, HUMANOID_SRDF, &mut second_model)
        .expect("second run");

    assert_eq!(first.added.as_slice(), second.added.as_slice());
    assert_eq!(first.disabled.as_slice(), second.disabled.as_slice());
    assert_eq!(
        first_model.collision_pairs().as_slice(),
        second_model.collision_pairs().as_slice()
    );
}

#[test]
fn test_reapplying_does_not_duplicate_registrations() {
    let (applier, mut model) = setup();
    applier
        .parse_stream(HUMANOID_URDF, HUMANOID_SRDF, &mut model)
        .expect("first run");
    applier
        .parse_stream(HUMANOID_URDF, HUMANOID_SRDF, &mut model)
        .expect("second run");
    assert_eq!(model.collision_pairs().len(), 2);
    assert_eq!(model.configurations().len(), 1);
}

#[test]
fn test_diagnostics_do_not_abort() {
    let (applier, mut model) = setup();
    let srdf = r#"
        <robot name="android">
            <group_state name="wave" group="arms">
                <joint name="shoulderL" value="1.2"/>
                <joint name="wrist" value="0.3"/>
            </group_state>
            <disable_collisions link1="torso" link2="head"/>
            <disable_collisions link1="armL" link2="armL"/>
            <disable_collisions link1="armR" link2="armL"/>
        </robot>
    "#;

    let result = applier
        .parse_stream(HUMANOID_URDF, srdf, &mut model)
        .expect("diagnostics are not fatal");

    assert_eq!(
        result.diagnostics,
        vec![
            Diagnostic::RobotNameMismatch {
                robot: "humanoid".into(),
                semantic: "android".into(),
            },
            Diagnostic::UnknownBodyReference {
                body: "head".into(),
                first: "torso".into(),
                second: "head".into(),
            },
            Diagnostic::SelfPairDeclaration {
                body: "armL".into()
            },
            Diagnostic::UnknownJointReference {
                configuration: "wave".into(),
                joint: "wrist".into(),
            },
        ]
    );
    assert_eq!(result.disabled.len(), 1);
    assert_eq!(result.added.len(), 2);
    assert_eq!(
        model.configuration("wave").expect("wave").joint_values.len(),
        1
    );
}

#[test]
fn test_joints_are_judged_against_the_model() {
    // Same bodies as the humanoid, but the model carries no joints.
    let mut model = RobotModel::new("humanoid");
    for body in ["torso", "armL", "armR"] {
        model.add_body(Body::new(body));
    }
    let applier = SemanticApplier::new(OverlayConfig::default());

    let result = applier
        .parse_stream(HUMANOID_URDF, HUMANOID_SRDF, &mut model)
        .expect("should apply");

    let unknown: Vec<&str> = result
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::UnknownJointReference { joint, .. } => Some(joint.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(unknown, vec!["shoulderL", "shoulderR"]);
    assert!(
        result
            .configuration("home")
            .expect("home is still resolved")
            .joint_values
            .is_empty()
    );
}

fn candidate_count(policy: CandidatePolicy) -> (usize, bool) {
    let (_, mut model) = setup();
    let applier = SemanticApplier::new(OverlayConfig {
        candidate_policy: policy,
        ..OverlayConfig::default()
    });
    let result = applier
        .parse_stream(HUMANOID_URDF, r#"<robot name="humanoid"/>"#, &mut model)
        .expect("should apply");
    let adjacent_added = model
        .adjacent_bodies()
        .iter()
        .any(|(parent, child)| result.is_added(parent, child));
    (result.added.len(), adjacent_added)
}

#[test]
fn test_candidate_policies() {
    for (policy, expected, adjacent) in [
        (CandidatePolicy::AllPairs, 3, true),
        (CandidatePolicy::SkipAdjacent, 1, false),
    ] {
        assert_eq!(candidate_count(policy), (expected, adjacent), "{policy:?}");
    }
}

#[test]
fn test_configurations_can_be_skipped() {
    let (_, mut model) = setup();
    let applier = SemanticApplier::new(OverlayConfig {
        register_configurations: false,
        ..OverlayConfig::default()
    });
    let result = applier
        .parse_stream(HUMANOID_URDF, HUMANOID_SRDF, &mut model)
        .expect("should apply");
    assert_eq!(result.configurations.len(), 1);
    assert!(model.configurations().is_empty());
}
