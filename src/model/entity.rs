use glam::{DMat3, DMat4, DQuat, DVec3, EulerRot};

use crate::utils::{
    constants::{ANGLES_KEY, ANGLE_KEY, CLASSNAME_KEY, ORIGIN_KEY, ROUNDING_EPSILON},
    misc::{format_number, format_vec3, parse_vec3, rotation_part, round_number},
};

#[derive(Debug, Clone, PartialEq)]
pub struct EntityProperty {
    pub key: String,
    pub value: String,
}

/// Key values of an entity plus the keys that linked group updates must not touch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    properties: Vec<EntityProperty>,
    protected_properties: Vec<String>,
}

/// `target2` is a numbered variant of `target`.
pub fn is_numbered_property(base: &str, key: &str) -> bool {
    key.strip_prefix(base)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// True if `key` or the key it is numbered after is in `protected`.
pub fn is_protected_key<S: AsRef<str>>(protected: &[S], key: &str) -> bool {
    protected.iter().any(|protected_key| {
        let protected_key = protected_key.as_ref();
        protected_key == key || is_numbered_property(protected_key, key)
    })
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_properties<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut res = Self::new();

        properties
            .into_iter()
            .for_each(|(key, value)| res.set_property(key, value));

        res
    }

    pub fn properties(&self) -> &[EntityProperty] {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.key == key)
            .map(|property| property.value.as_str())
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// Keeps the position of an existing key.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.properties.iter_mut().find(|property| property.key == key) {
            Some(property) => property.value = value,
            None => self.properties.push(EntityProperty { key, value }),
        }
    }

    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        let index = self
            .properties
            .iter()
            .position(|property| property.key == key)?;

        Some(self.properties.remove(index).value)
    }

    pub fn classname(&self) -> Option<&str> {
        self.property(CLASSNAME_KEY)
    }

    pub fn origin(&self) -> Option<DVec3> {
        self.property(ORIGIN_KEY).and_then(parse_vec3)
    }

    pub fn protected_properties(&self) -> &[String] {
        &self.protected_properties
    }

    pub fn set_protected_properties(&mut self, keys: Vec<String>) {
        self.protected_properties = keys;
    }

    pub fn protect_property(&mut self, key: impl Into<String>) {
        let key = key.into();

        if !self.protected_properties.contains(&key) {
            self.protected_properties.push(key);
        }
    }

    pub fn is_protected(&self, key: &str) -> bool {
        is_protected_key(&self.protected_properties, key)
    }

    /// Point entities carry their placement in `origin`, `angle` and `angles`.
    /// Brush entities are moved through their brushes and keep their properties.
    pub fn transformed(&self, transformation: &DMat4, point_entity: bool) -> Self {
        let mut res = self.clone();

        if !point_entity {
            return res;
        }

        let origin = self.origin();
        let new_origin = transformation.transform_point3(origin.unwrap_or_default());

        if origin.is_some() || new_origin != DVec3::ZERO {
            res.set_property(ORIGIN_KEY, format_vec3(new_origin));
        }

        let Some(rotation) = rotation_part(transformation) else {
            return res;
        };

        if let Some(angle) = self.property(ANGLE_KEY).and_then(|s| s.trim().parse::<f64>().ok()) {
            res.set_property(ANGLE_KEY, format_number(rotate_yaw(angle, &rotation)));
        }

        if let Some(angles) = self.property(ANGLES_KEY).and_then(parse_vec3) {
            res.set_property(ANGLES_KEY, format_vec3(rotate_angles(angles, &rotation)));
        }

        res
    }
}

fn normalize_degrees(degrees: f64) -> f64 {
    let res = round_number(degrees).rem_euclid(360.);

    if res >= 360. - ROUNDING_EPSILON {
        0.
    } else {
        res
    }
}

// -1 and -2 point straight up and down and have no yaw to rotate
fn rotate_yaw(angle: f64, rotation: &DMat3) -> f64 {
    if angle == -1. || angle == -2. {
        return angle;
    }

    let radians = angle.to_radians();
    let direction = *rotation * DVec3::new(radians.cos(), radians.sin(), 0.);

    normalize_degrees(direction.y.atan2(direction.x).to_degrees())
}

/// `angles` is "pitch yaw roll" in degrees.
fn rotate_angles(angles: DVec3, rotation: &DMat3) -> DVec3 {
    let current = DMat3::from_euler(
        EulerRot::ZYX,
        angles.y.to_radians(),
        angles.x.to_radians(),
        angles.z.to_radians(),
    );

    let (yaw, pitch, roll) = DQuat::from_mat3(&(*rotation * current)).to_euler(EulerRot::ZYX);

    DVec3::new(
        normalize_degrees(pitch.to_degrees()),
        normalize_degrees(yaw.to_degrees()),
        normalize_degrees(roll.to_degrees()),
    )
}
