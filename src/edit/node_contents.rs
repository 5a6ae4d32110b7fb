use crate::{
    error::SceneError,
    model::{NodeId, NodeKind, Scene},
};

/// Gives every listed node a new payload of the same variant.
///
/// Returns the old payloads, which undo the swap when passed back in. Nothing
/// changes if any node is missing or would change its variant.
pub fn swap_node_contents(
    scene: &mut Scene,
    nodes: Vec<(NodeId, NodeKind)>,
) -> Result<Vec<(NodeId, NodeKind)>, SceneError> {
    for (id, kind) in &nodes {
        let current = scene.get(*id)?.kind();

        if !current.same_variant(kind) {
            return Err(SceneError::ContentsMismatch {
                node: *id,
                from: current.name(),
                to: kind.name(),
            });
        }
    }

    let mut res = Vec::with_capacity(nodes.len());

    for (id, kind) in nodes {
        res.push((id, scene.swap_kind(id, kind)?));
    }

    // undo in reverse so that repeated ids restore the oldest payload
    res.reverse();

    Ok(res)
}

#[cfg(test)]
mod test {
    use glam::DVec3;

    use crate::model::{
        test_utils::{approx_eq, cube_brush},
        Group,
    };

    use super::*;

    #[test]
    fn swap_and_undo() {
        let mut scene = Scene::new();
        let layer = scene.default_layer();
        let a = scene.add_node(layer, cube_brush(DVec3::ZERO, 8.)).unwrap();
        let b = scene.add_node(layer, cube_brush(DVec3::X * 32., 8.)).unwrap();

        let undo = swap_node_contents(
            &mut scene,
            vec![
                (a, cube_brush(DVec3::ZERO, 16.)),
                (b, cube_brush(DVec3::X * 32., 16.)),
            ],
        )
        .unwrap();

        let bounds = scene.logical_bounds(a).unwrap();
        assert!(approx_eq(bounds.max, DVec3::splat(16.)));

        swap_node_contents(&mut scene, undo).unwrap();

        let bounds = scene.logical_bounds(a).unwrap();
        assert!(approx_eq(bounds.max, DVec3::splat(8.)));
        let bounds = scene.logical_bounds(b).unwrap();
        assert!(approx_eq(bounds.center(), DVec3::X * 32.));
    }

    #[test]
    fn mismatch_changes_nothing() {
        let mut scene = Scene::new();
        let layer = scene.default_layer();
        let a = scene.add_node(layer, cube_brush(DVec3::ZERO, 8.)).unwrap();
        let b = scene.add_node(layer, cube_brush(DVec3::X * 32., 8.)).unwrap();

        let res = swap_node_contents(
            &mut scene,
            vec![
                (a, cube_brush(DVec3::ZERO, 16.)),
                (b, NodeKind::Group(Group::new("g"))),
            ],
        );

        assert!(matches!(res, Err(SceneError::ContentsMismatch { node, .. }) if node == b));
        let bounds = scene.logical_bounds(a).unwrap();
        assert!(approx_eq(bounds.max, DVec3::splat(8.)));
    }
}
