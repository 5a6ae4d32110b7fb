pub const EPSILON: f64 = 0.0000001;

/// Vertices closer than this are merged when building brush geometry.
pub const VERTEX_EPSILON: f64 = 0.0001;

/// Values this close to an integer are written as that integer.
pub const ROUNDING_EPSILON: f64 = 0.000001;

/// Half size of the default world bounds.
pub const DEFAULT_WORLD_BOUND: f64 = 8192.;

/// Half size of the box used as the bounds of a point entity.
pub const POINT_ENTITY_HALF_SIZE: f64 = 8.;

pub const DEFAULT_LAYER_NAME: &str = "Default Layer";
pub const DEFAULT_TEXTURE: &str = "__TB_empty";

pub const CLASSNAME_KEY: &str = "classname";
pub const ORIGIN_KEY: &str = "origin";
pub const ANGLE_KEY: &str = "angle";
pub const ANGLES_KEY: &str = "angles";

pub const WORLDSPAWN_CLASSNAME: &str = "worldspawn";
pub const GROUP_CLASSNAME: &str = "func_group";

pub const TB_TYPE_KEY: &str = "_tb_type";
pub const TB_LAYER_TYPE: &str = "_tb_layer";
pub const TB_GROUP_TYPE: &str = "_tb_group";
pub const TB_NAME_KEY: &str = "_tb_name";
pub const TB_ID_KEY: &str = "_tb_id";
pub const TB_LAYER_KEY: &str = "_tb_layer";
pub const TB_GROUP_KEY: &str = "_tb_group";
pub const TB_LINKED_GROUP_ID_KEY: &str = "_tb_linked_group_id";
pub const TB_TRANSFORMATION_KEY: &str = "_tb_transformation";
pub const TB_LAYER_SORT_INDEX_KEY: &str = "_tb_layer_sort_index";
pub const TB_LAYER_HIDDEN_KEY: &str = "_tb_layer_hidden";
pub const TB_LAYER_LOCKED_KEY: &str = "_tb_layer_locked";
pub const TB_PROTECTED_PROPERTIES_KEY: &str = "_tb_protected_properties";

/// Keys the editor writes for its own bookkeeping. They never show up as entity properties.
pub const TB_RESERVED_KEYS: &[&str] = &[
    TB_TYPE_KEY,
    TB_NAME_KEY,
    TB_ID_KEY,
    TB_LAYER_KEY,
    TB_GROUP_KEY,
    TB_LINKED_GROUP_ID_KEY,
    TB_TRANSFORMATION_KEY,
    TB_LAYER_SORT_INDEX_KEY,
    TB_LAYER_HIDDEN_KEY,
    TB_LAYER_LOCKED_KEY,
    TB_PROTECTED_PROPERTIES_KEY,
];

pub const DEFAULT_TB_HEADER: &[&str] = &[" Game: Generic", " Format: Valve"];
