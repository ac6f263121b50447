use nalgebra::Isometry3;

use crate::{Primitive, World, WorldBody, WorldError, WorldOp};

fn add(body: WorldBody) -> WorldOp {
    WorldOp::Add {
        body,
        pose: Isometry3::identity(),
        rigidly_attached: false,
        frame_id: None,
    }
}

#[test]
fn add_then_query() {
    let mut world = World::new();
    world
        .apply(add(WorldBody::primitive(
            "box",
            Primitive::Box {
                size: [0.2, 0.3, 0.05],
            },
        )))
        .unwrap();
    assert!(world.contains("box"));
    assert_eq!(world.len(), 1);
}

#[test]
fn duplicate_add_is_rejected_and_first_body_remains() {
    let mut world = World::new();
    world
        .apply(add(WorldBody::mesh("table", "meshes/big_table_1.stl")))
        .unwrap();
    let err = world
        .apply(add(WorldBody::mesh("table", "meshes/other.stl")))
        .unwrap_err();
    assert_eq!(err, WorldError::DuplicateBody("table".to_owned()));

    let state = world.get("table").unwrap();
    match &state.body.shape {
        crate::BodyShape::Mesh { resource } => assert_eq!(resource, "meshes/big_table_1.stl"),
        other => panic!("unexpected shape {other:?}"),
    }
}

#[test]
fn cone_is_a_corrupt_shape_and_world_unchanged() {
    let mut world = World::new();
    let err = world
        .apply(add(WorldBody::primitive(
            "cone",
            Primitive::Cone {
                height: 0.01,
                radius: 0.05,
            },
        )))
        .unwrap_err();
    assert_eq!(err, WorldError::CorruptShape("cone".to_owned()));
    assert!(world.is_empty());
}

#[test]
fn nonpositive_dimensions_are_corrupt() {
    let mut world = World::new();
    let err = world
        .apply(add(WorldBody::primitive(
            "flat",
            Primitive::Box {
                size: [0.1, 0.0, 0.1],
            },
        )))
        .unwrap_err();
    assert_eq!(err, WorldError::CorruptShape("flat".to_owned()));
}

#[test]
fn remove_missing_body() {
    let mut world = World::new();
    let err = world
        .apply(WorldOp::Remove {
            name: "ghost".to_owned(),
        })
        .unwrap_err();
    assert_eq!(err, WorldError::MissingBody("ghost".to_owned()));
}

#[test]
fn remove_all_clears() {
    let mut world = World::new();
    world
        .apply(add(WorldBody::primitive(
            "sphere",
            Primitive::Sphere { radius: 0.05 },
        )))
        .unwrap();
    world
        .apply(add(WorldBody::primitive(
            "cylinder",
            Primitive::Cylinder {
                height: 0.1,
                radius: 0.03,
            },
        )))
        .unwrap();
    world.apply(WorldOp::RemoveAll).unwrap();
    assert!(world.is_empty());
}

#[test]
fn attach_and_detach() {
    let mut world = World::new();
    world
        .apply(WorldOp::Add {
            body: WorldBody::primitive(
                "wand",
                Primitive::Cylinder {
                    height: 0.15,
                    radius: 0.005,
                },
            ),
            pose: Isometry3::identity(),
            rigidly_attached: true,
            frame_id: Some("l_gripper_tool_frame".to_owned()),
        })
        .unwrap();
    assert_eq!(
        world.get("wand").unwrap().attached_to.as_deref(),
        Some("l_gripper_tool_frame")
    );

    world
        .apply(WorldOp::Detach {
            name: "wand".to_owned(),
        })
        .unwrap();
    assert!(world.get("wand").unwrap().attached_to.is_none());

    // A second detach has nothing to release.
    let err = world
        .apply(WorldOp::Detach {
            name: "wand".to_owned(),
        })
        .unwrap_err();
    assert_eq!(err, WorldError::UnknownBody("wand".to_owned()));
}

#[test]
fn attach_requires_a_frame() {
    let mut world = World::new();
    let err = world
        .apply(WorldOp::Add {
            body: WorldBody::primitive("thing", Primitive::Sphere { radius: 0.05 }),
            pose: Isometry3::identity(),
            rigidly_attached: true,
            frame_id: None,
        })
        .unwrap_err();
    assert_eq!(err, WorldError::UnknownBody("thing".to_owned()));
}

#[test]
fn urdf_bodies_are_not_loadable() {
    let mut world = World::new();
    let err = world
        .apply(add(WorldBody {
            name: "kitchen".to_owned(),
            shape: crate::BodyShape::Urdf {
                description: "<robot/>".to_owned(),
            },
        }))
        .unwrap_err();
    assert_eq!(err, WorldError::UnknownBody("kitchen".to_owned()));
}
