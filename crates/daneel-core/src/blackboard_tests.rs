use crate::{paths, Blackboard, CoreError, LazyValue, Path, Value};

#[test]
fn set_get_roundtrip() {
    let mut bb = Blackboard::new();
    let path = paths::goal("g1").child("gain");
    bb.set(&path, 10.0);
    assert_eq!(bb.get_scalar(&path).unwrap(), 10.0);
}

#[test]
fn get_reports_longest_resolvable_prefix() {
    let mut bb = Blackboard::new();
    bb.set(&Path::from_names(["a", "b"]), 1.0);
    let err = bb.get(&Path::from_names(["a", "x", "y"])).unwrap_err();
    match err {
        CoreError::PathMissing { path, prefix } => {
            assert_eq!(path, "a/x/y");
            assert_eq!(prefix, "a");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn set_replaces_terminal_value() {
    let mut bb = Blackboard::new();
    let path = Path::from_names(["x"]);
    bb.set(&path, 1.0);
    bb.set(&path, 2.0);
    assert_eq!(bb.get_scalar(&path).unwrap(), 2.0);
}

#[test]
fn set_through_leaf_replaces_it_with_branch() {
    let mut bb = Blackboard::new();
    bb.set(&Path::from_names(["a"]), 1.0);
    bb.set(&Path::from_names(["a", "b"]), 2.0);
    assert_eq!(bb.get_scalar(&Path::from_names(["a", "b"])).unwrap(), 2.0);
    assert!(bb.get(&Path::from_names(["a"])).is_err());
}

#[test]
fn lazy_leaf_invoked_on_get() {
    let mut bb = Blackboard::new();
    bb.set(&Path::from_names(["base"]), 2.0);
    bb.set(
        &Path::from_names(["doubled"]),
        Value::Lazy(LazyValue::new(|bb| {
            let base = bb.get_scalar(&Path::from_names(["base"])).unwrap_or(0.0);
            Value::Scalar(base * 2.0)
        })),
    );
    assert_eq!(bb.get_scalar(&Path::from_names(["doubled"])).unwrap(), 4.0);

    bb.set(&Path::from_names(["base"]), 5.0);
    assert_eq!(bb.get_scalar(&Path::from_names(["doubled"])).unwrap(), 10.0);
}

#[test]
fn to_symbol_is_idempotent() {
    let mut bb = Blackboard::new();
    let path = paths::joint_position("torso_lift_joint");
    let a = bb.to_symbol(&path);
    let b = bb.to_symbol(&path);
    assert_eq!(a, b);
    let c = bb.to_symbol(&paths::joint_position("elbow_joint"));
    assert_ne!(a, c);
}

#[test]
fn symbol_identity_survives_snapshot_restore() {
    let mut bb = Blackboard::new();
    let path = paths::joint_position("j0");
    let before = bb.to_symbol(&path);

    let snap = bb.snapshot();
    let inside = bb.to_symbol(&paths::joint_position("j_new"));
    bb.restore(snap);

    assert_eq!(bb.to_symbol(&path), before);
    // Symbols issued inside the universe keep their identity too.
    assert_eq!(bb.to_symbol(&paths::joint_position("j_new")), inside);
}

#[test]
fn resolve_reads_in_symbol_order() {
    let mut bb = Blackboard::new();
    let p1 = Path::from_names(["one"]);
    let p2 = Path::from_names(["two"]);
    bb.set(&p1, 1.0);
    bb.set(&p2, 2.0);
    let s1 = bb.to_symbol(&p1);
    let s2 = bb.to_symbol(&p2);

    let mut out = [0.0; 2];
    bb.resolve(&[s2, s1], &mut out).unwrap();
    assert_eq!(out, [2.0, 1.0]);
}

#[test]
fn resolve_rejects_non_scalar_leaves() {
    let mut bb = Blackboard::new();
    let path = Path::from_names(["text"]);
    bb.set(&path, "hello");
    let sym = bb.to_symbol(&path);
    let mut out = [0.0];
    assert!(matches!(
        bb.resolve(&[sym], &mut out),
        Err(CoreError::NonScalar { .. })
    ));
}

#[test]
fn snapshot_restore_is_bit_identical() {
    let mut bb = Blackboard::new();
    bb.set(&Path::from_names(["a", "b"]), 1.5);
    bb.set(&Path::from_names(["a", "c"]), [0.0, 1.0, 2.0]);
    let reference = format!("{bb:?}");

    let snap = bb.snapshot();
    bb.set(&Path::from_names(["a", "b"]), 99.0);
    bb.set(&Path::from_names(["planned"]), 1.0);
    bb.remove(&Path::from_names(["a", "c"]));
    bb.restore(snap);

    assert_eq!(format!("{bb:?}"), reference);
}

#[test]
fn nested_snapshots_follow_stack_discipline() {
    let mut bb = Blackboard::new();
    bb.set(&Path::from_names(["x"]), 0.0);

    let outer = bb.snapshot();
    bb.set(&Path::from_names(["x"]), 1.0);
    let inner = bb.snapshot();
    bb.set(&Path::from_names(["x"]), 2.0);

    bb.restore(inner);
    assert_eq!(bb.get_scalar(&Path::from_names(["x"])).unwrap(), 1.0);
    bb.restore(outer);
    assert_eq!(bb.get_scalar(&Path::from_names(["x"])).unwrap(), 0.0);
}

#[test]
fn typed_leaves_roundtrip() {
    use crate::{JointStates, Pose, SingleJointState, Trajectory};

    let mut bb = Blackboard::new();
    bb.set(&Path::from_names(["tip_pose"]), Pose::identity());
    let mut js = JointStates::new();
    js.insert(SingleJointState::new("j0", 0.5));
    bb.set(&Path::from_names(["snapshot_js"]), js.clone());
    bb.set(&Path::from_names(["traj"]), Trajectory::new());
    bb.set(&Path::from_names(["quat"]), Value::Quat([0.0, 0.0, 0.0, 1.0]));

    assert_eq!(
        bb.get(&Path::from_names(["tip_pose"]))
            .unwrap()
            .as_pose()
            .copied(),
        Some(Pose::identity())
    );
    assert_eq!(
        bb.get(&Path::from_names(["snapshot_js"]))
            .unwrap()
            .as_joints()
            .cloned(),
        Some(js)
    );
    assert_eq!(
        bb.get(&Path::from_names(["traj"])).unwrap().as_traj().map(Trajectory::len),
        Some(0)
    );
}

#[test]
fn remove_subtree() {
    let mut bb = Blackboard::new();
    bb.set(&Path::from_names(["w", "a"]), 1.0);
    bb.set(&Path::from_names(["w", "b"]), 2.0);
    assert!(bb.remove(&Path::from_names(["w", "a"])));
    assert!(!bb.remove(&Path::from_names(["w", "a"])));
    assert!(bb.contains(&Path::from_names(["w", "b"])));
}
