use glam::{DMat3, DMat4, DVec3};

use super::constants::{EPSILON, ROUNDING_EPSILON};

/// `None` if the matrix cannot be inverted.
pub fn try_invert(transformation: &DMat4) -> Option<DMat4> {
    let determinant = transformation.determinant();

    if !transformation.is_finite() || determinant.abs() <= EPSILON {
        return None;
    }

    Some(transformation.inverse())
}

pub fn linear_part(transformation: &DMat4) -> DMat3 {
    DMat3::from_mat4(*transformation)
}

/// Linear part with its columns normalized, which removes scaling.
pub fn rotation_part(transformation: &DMat4) -> Option<DMat3> {
    let linear = linear_part(transformation);
    let (x, y, z) = (linear.x_axis, linear.y_axis, linear.z_axis);

    if x.length() <= EPSILON || y.length() <= EPSILON || z.length() <= EPSILON {
        return None;
    }

    Some(DMat3::from_cols(x.normalize(), y.normalize(), z.normalize()))
}

pub fn is_identity(transformation: &DMat4) -> bool {
    transformation.abs_diff_eq(DMat4::IDENTITY, EPSILON)
}

// snaps values like 63.99999999 back to 64 so that written maps stay clean
pub fn round_number(value: f64) -> f64 {
    let rounded = value.round();

    let res = if (value - rounded).abs() < ROUNDING_EPSILON {
        rounded
    } else {
        (value * 1_000_000.).round() / 1_000_000.
    };

    // no "-0"
    if res == 0. {
        0.
    } else {
        res
    }
}

pub fn format_number(value: f64) -> String {
    format!("{}", round_number(value))
}

pub fn format_vec3(value: DVec3) -> String {
    format!(
        "{} {} {}",
        format_number(value.x),
        format_number(value.y),
        format_number(value.z)
    )
}

pub fn parse_vec3(s: &str) -> Option<DVec3> {
    let values = s
        .split_ascii_whitespace()
        .map(|v| v.parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;

    match values.as_slice() {
        [x, y, z] => Some(DVec3::new(*x, *y, *z)),
        _ => None,
    }
}

/// 16 numbers, row by row.
pub fn parse_matrix(s: &str) -> Option<DMat4> {
    let values = s
        .split_ascii_whitespace()
        .map(|v| v.parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;

    let values: [f64; 16] = values.try_into().ok()?;

    Some(DMat4::from_cols_array(&values).transpose())
}

pub fn format_matrix(transformation: &DMat4) -> String {
    transformation
        .transpose()
        .to_cols_array()
        .iter()
        .map(|v| format_number(*v))
        .collect::<Vec<String>>()
        .join(" ")
}
