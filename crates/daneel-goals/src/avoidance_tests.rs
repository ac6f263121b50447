use approx::assert_relative_eq;

use daneel_core::{paths, Blackboard, PathKey};

use crate::test_support::{eval, planar_robot, publish_identity_fk, set_joint};
use crate::{fit_reciprocal, Goal, LinkToAnyAvoidance, LOW_WEIGHT, MAX_WEIGHT, ZERO_WEIGHT};

fn publish_contact(bb: &mut Blackboard, link: &str, dist_below_link: f64) {
    // Link point at the origin, body point straight down, normal +z.
    let root = paths::collision(link);
    bb.set(&root.child("min_dist"), dist_below_link);
    for (field, v) in [
        ("contact_normal", [0.0, 0.0, 1.0]),
        ("position_on_a", [0.0, 0.0, 0.0]),
        ("position_on_b", [0.0, 0.0, -dist_below_link]),
    ] {
        let base = root.child(field);
        for (i, value) in v.iter().enumerate() {
            bb.set(&base.child(PathKey::Index(i)), *value);
        }
    }
}

#[test]
fn fit_passes_through_anchor_points() {
    let x = [0.0, 0.02, 0.05];
    let y = [MAX_WEIGHT, LOW_WEIGHT, ZERO_WEIGHT];
    let (a, b, c) = fit_reciprocal(x, y).unwrap();
    for i in 0..3 {
        assert_relative_eq!(a / (x[i] + c) + b, y[i], epsilon = 1e-9);
    }
}

#[test]
fn fit_rejects_degenerate_anchors() {
    assert!(fit_reciprocal([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).is_none());
}

#[test]
fn distance_expression_matches_published_contact() {
    let mut bb = Blackboard::new();
    let robot = planar_robot(&mut bb);
    set_joint(&mut bb, "shoulder", 0.0);
    set_joint(&mut bb, "elbow", 0.0);
    publish_identity_fk(&mut bb, "base", "forearm");
    publish_contact(&mut bb, "forearm", 0.03);

    let goal = LinkToAnyAvoidance::new("forearm");
    goal.install(&mut bb).unwrap();
    let constraints = goal.soft_constraints(&mut bb, &robot).unwrap();
    let sc = &constraints["LinkToAnyAvoidance/forearm"];

    assert_relative_eq!(eval(&bb, &sc.expression), 0.03, epsilon = 1e-9);
    assert_relative_eq!(eval(&bb, &sc.lower), 0.1, epsilon = 1e-9);
    assert_relative_eq!(eval(&bb, &sc.upper), 0.1, epsilon = 1e-9);
}

#[test]
fn weight_follows_the_fitted_curve() {
    let mut bb = Blackboard::new();
    let robot = planar_robot(&mut bb);
    set_joint(&mut bb, "shoulder", 0.0);
    set_joint(&mut bb, "elbow", 0.0);
    publish_identity_fk(&mut bb, "base", "forearm");

    let goal = LinkToAnyAvoidance::new("forearm");
    goal.install(&mut bb).unwrap();
    let constraints = goal.soft_constraints(&mut bb, &robot).unwrap();
    let sc = &constraints["LinkToAnyAvoidance/forearm"];

    // Touching: full weight.
    publish_contact(&mut bb, "forearm", 0.0);
    assert_relative_eq!(eval(&bb, &sc.weight), MAX_WEIGHT, epsilon = 1e-9);

    // At the low anchor.
    publish_contact(&mut bb, "forearm", 0.02);
    assert_relative_eq!(eval(&bb, &sc.weight), LOW_WEIGHT, epsilon = 1e-6);

    // Past the zero threshold: constraint fades out entirely.
    publish_contact(&mut bb, "forearm", 0.08);
    assert_relative_eq!(eval(&bb, &sc.weight), 0.0, epsilon = 1e-9);

    // Penetrating: clamped to full weight.
    publish_contact(&mut bb, "forearm", -0.01);
    assert_relative_eq!(eval(&bb, &sc.weight), MAX_WEIGHT, epsilon = 1e-9);
}

#[test]
fn clear_sentinel_zeroes_the_weight() {
    let mut bb = Blackboard::new();
    let robot = planar_robot(&mut bb);
    set_joint(&mut bb, "shoulder", 0.0);
    set_joint(&mut bb, "elbow", 0.0);
    publish_identity_fk(&mut bb, "base", "forearm");
    publish_contact(&mut bb, "forearm", 100.0);

    let goal = LinkToAnyAvoidance::new("forearm");
    goal.install(&mut bb).unwrap();
    let constraints = goal.soft_constraints(&mut bb, &robot).unwrap();
    let sc = &constraints["LinkToAnyAvoidance/forearm"];
    assert_relative_eq!(eval(&bb, &sc.weight), 0.0, epsilon = 1e-9);
    assert_relative_eq!(eval(&bb, &sc.expression), 100.0, epsilon = 1e-9);
}

#[test]
fn collision_links_lists_the_link() {
    let goal = LinkToAnyAvoidance::new("forearm");
    assert_eq!(goal.collision_links(), vec!["forearm".to_owned()]);
}
