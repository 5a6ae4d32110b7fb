use crate::model::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("Node {0} does not exist")]
    NodeNotFound(NodeId),
    #[error("A {child} node cannot be a child of a {parent} node")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },
    #[error("The world node cannot be removed")]
    RemoveWorld,
    #[error("The default layer cannot be removed")]
    RemoveDefaultLayer,
    #[error("Node {node} is a {from} node and cannot take {to} contents")]
    ContentsMismatch {
        node: NodeId,
        from: &'static str,
        to: &'static str,
    },
    #[error("Node {0} is not a group")]
    NotAGroup(NodeId),
    #[error("Node {0} is changed together with one of its ancestors")]
    OverlappingChanges(NodeId),
    #[error("Brush node {node} has no face {face_index}")]
    FaceNotFound { node: NodeId, face_index: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrushError {
    #[error("Brush needs at least 4 faces, got {0}")]
    TooFewFaces(usize),
    #[error("Face {0} has collinear points")]
    DegenerateFace(usize),
    #[error("Brush has no volume")]
    EmptyVolume,
    #[error("Transformation is not invertible")]
    SingularTransformation,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    #[error("Patch rows and columns must be odd and at least 3, got {rows}x{columns}")]
    InvalidDimensions { rows: usize, columns: usize },
    #[error("Patch needs {expected} control points, got {got}")]
    PointCount { expected: usize, got: usize },
    #[error("Patch has non finite control points")]
    NonFinite,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("Brush: {0}")]
    Brush(#[from] BrushError),
    #[error("Patch: {0}")]
    Patch(#[from] PatchError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkedGroupError {
    #[error("Node {0} does not exist")]
    NodeNotFound(NodeId),
    #[error("Node {0} is not a group")]
    NotAGroup(NodeId),
    #[error("Node {0} is not a linked group")]
    NotLinked(NodeId),
    #[error("Group transformation of node {0} is not invertible")]
    NonInvertibleTransformation(NodeId),
    #[error("Failed to transform node {node}: {source}")]
    TransformFailed {
        node: NodeId,
        #[source]
        source: TransformError,
    },
    #[error("Updating a linked node would exceed world bounds (source node {node})")]
    OutOfWorldBounds { node: NodeId },
    #[error("Cannot update multiple members of link set {0}")]
    ConflictingSources(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Map does not start with a worldspawn entity")]
    MissingWorldspawn,
    #[error("Entity {entity} refers to unknown parent {parent}")]
    UnknownParent { entity: usize, parent: String },
    #[error("Entity {entity} reuses {key} {id}")]
    DuplicateId {
        entity: usize,
        key: &'static str,
        id: String,
    },
    #[error("Entity {entity} has an invalid {key}: \"{value}\"")]
    InvalidValue {
        entity: usize,
        key: &'static str,
        value: String,
    },
    #[error("Entity {entity} brush {brush}: {source}")]
    Brush {
        entity: usize,
        brush: usize,
        #[source]
        source: BrushError,
    },
    #[error("Entity {entity} patch {patch}: {source}")]
    Patch {
        entity: usize,
        patch: usize,
        #[source]
        source: PatchError,
    },
    #[error(transparent)]
    Scene(#[from] SceneError),
}
