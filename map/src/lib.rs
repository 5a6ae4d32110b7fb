mod error;

pub use error::MapError;

use std::{
    fmt,
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
};

use glam::{DVec2, DVec3, DVec4};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_till1},
    character::complete::{multispace0, space0},
    combinator::{all_consuming, map, verify},
    multi::{fold_many0, many0, many1},
    number::complete::double as _double,
    sequence::{delimited, preceded, terminated, tuple},
    IResult as _IResult,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BrushPlane {
    pub p1: DVec3,
    pub p2: DVec3,
    pub p3: DVec3,
    pub texture_name: String,
    /// Ux Uy Uz Uoffset
    pub u: DVec4,
    /// Vx Vy Vz Voffset
    pub v: DVec4,
    pub rotation: f64,
    pub u_scale: f64,
    pub v_scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub planes: Vec<BrushPlane>,
}

/// One control point of a `patchDef2`: position followed by texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchPoint {
    pub position: DVec3,
    pub uv: DVec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub texture_name: String,
    pub row_count: usize,
    pub column_count: usize,
    /// Row major, `row_count * column_count` points.
    pub points: Vec<PatchPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Brush(Brush),
    Patch(Patch),
}

/// Entity key values, kept in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Replaces the value in place if the key exists, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, old)) => *old = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut res = Self::new();
        iter.into_iter().for_each(|(k, v)| res.insert(k, v));
        res
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    // All entities have attributes.
    pub attributes: Attributes,
    pub primitives: Vec<Primitive>,
}

impl Entity {
    pub fn classname(&self) -> Option<&str> {
        self.attributes.get("classname")
    }

    pub fn brushes(&self) -> impl Iterator<Item = &Brush> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            Primitive::Brush(brush) => Some(brush),
            Primitive::Patch(_) => None,
        })
    }

    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.primitives.iter().filter_map(|primitive| match primitive {
            Primitive::Patch(patch) => Some(patch),
            Primitive::Brush(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map {
    /// `// Game: ...` and `// Format: ...` lines, without the leading `//`.
    pub tb_header: Vec<String>,
    pub entities: Vec<Entity>,
}

impl Map {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path)?;

        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<Self, MapError> {
        match parse_map(text) {
            Ok((_, res)) => Ok(res),
            Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
                let offset = text.len() - err.input.len();

                Err(MapError::Parse {
                    line: text[..offset].matches('\n').count() + 1,
                    kind: err.code.description().to_string(),
                })
            }
            Err(nom::Err::Incomplete(_)) => Err(MapError::Incomplete),
        }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path.as_ref())?;

        let mut file = BufWriter::new(file);

        file.write_all(self.to_string().as_bytes())?;
        file.flush()?;

        Ok(())
    }

    pub fn worldspawn(&self) -> Option<&Entity> {
        self.entities
            .first()
            .filter(|entity| entity.classname() == Some("worldspawn"))
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.tb_header {
            writeln!(f, "//{}", s)?;
        }

        for (entity_index, entity) in self.entities.iter().enumerate() {
            writeln!(f, "// entity {}", entity_index)?;
            writeln!(f, "{{")?;

            for (key, value) in entity.attributes.iter() {
                writeln!(f, "\"{}\" \"{}\"", key, value)?;
            }

            for (primitive_index, primitive) in entity.primitives.iter().enumerate() {
                writeln!(f, "// brush {}", primitive_index)?;
                writeln!(f, "{{")?;

                match primitive {
                    Primitive::Brush(brush) => {
                        for plane in &brush.planes {
                            writeln!(
                                f,
                                "( {} {} {} ) ( {} {} {} ) ( {} {} {} ) {} [ {} {} {} {} ] [ {} {} {} {} ] {} {} {}",
                                plane.p1.x, plane.p1.y, plane.p1.z,
                                plane.p2.x, plane.p2.y, plane.p2.z,
                                plane.p3.x, plane.p3.y, plane.p3.z,
                                plane.texture_name,
                                plane.u.x, plane.u.y, plane.u.z, plane.u.w,
                                plane.v.x, plane.v.y, plane.v.z, plane.v.w,
                                plane.rotation, plane.u_scale, plane.v_scale,
                            )?;
                        }
                    }
                    Primitive::Patch(patch) => {
                        writeln!(f, "patchDef2")?;
                        writeln!(f, "{{")?;
                        writeln!(f, "{}", patch.texture_name)?;
                        writeln!(f, "( {} {} 0 0 0 )", patch.row_count, patch.column_count)?;
                        writeln!(f, "(")?;

                        for row in patch.points.chunks(patch.column_count.max(1)) {
                            write!(f, "(")?;
                            for point in row {
                                write!(
                                    f,
                                    " ( {} {} {} {} {} )",
                                    point.position.x,
                                    point.position.y,
                                    point.position.z,
                                    point.uv.x,
                                    point.uv.y
                                )?;
                            }
                            writeln!(f, " )")?;
                        }

                        writeln!(f, ")")?;
                        writeln!(f, "}}")?;
                    }
                }

                writeln!(f, "}}")?;
            }

            writeln!(f, "}}")?;
        }

        Ok(())
    }
}

type IResult<'a, T> = _IResult<&'a str, T>;

fn take_comment_line(i: &str) -> IResult<&str> {
    terminated(
        preceded(tuple((space0, tag("//"))), take_till(|c| c == '\n')),
        multispace0,
    )(i)
}

fn take_tb_header(i: &str) -> IResult<Vec<String>> {
    many0(map(
        verify(take_comment_line, |s: &str| {
            let s = s.trim();
            s.starts_with("Game:") || s.starts_with("Format:")
        }),
        |s: &str| s.trim_end().to_string(),
    ))(i)
}

// Many 0 because it doesn't necessary have it every time.
fn discard_comment_lines(i: &str) -> IResult<&str> {
    map(many0(take_comment_line), |_| "")(i)
}

pub fn double(i: &str) -> IResult<f64> {
    preceded(space0, _double)(i)
}

fn between_line_bracket<'a, T>(
    f: impl FnMut(&'a str) -> IResult<'a, T>,
) -> impl FnMut(&'a str) -> IResult<'a, T> {
    terminated(
        preceded(tuple((space0, tag("{"), multispace0)), f),
        tuple((space0, tag("}"), multispace0)),
    )
}

fn quoted_text(i: &str) -> IResult<&str> {
    terminated(preceded(tag("\""), take_till(|c| c == '"')), tag("\""))(i)
}

fn texture_name(i: &str) -> IResult<String> {
    map(
        terminated(take_till1(|c: char| c.is_whitespace()), space0),
        |s: &str| s.to_string(),
    )(i)
}

// For brushes
// These ones take in space0 at the end
// just to make sure that the next thing we read is a value.
fn parse_plane_coordinate(i: &str) -> IResult<DVec3> {
    terminated(
        preceded(
            tuple((space0, tag("("), space0)),
            map(tuple((double, double, double)), |(x, y, z)| {
                DVec3::new(x, y, z)
            }),
        ),
        tuple((space0, tag(")"), space0)),
    )(i)
}

fn parse_plane_uv(i: &str) -> IResult<DVec4> {
    terminated(
        preceded(
            tuple((space0, tag("["), space0)),
            map(
                tuple((double, double, double, double)),
                |(x, y, z, offset)| DVec4::new(x, y, z, offset),
            ),
        ),
        tuple((space0, tag("]"), space0)),
    )(i)
}

fn parse_brush_plane(i: &str) -> IResult<BrushPlane> {
    map(
        tuple((
            parse_plane_coordinate,
            parse_plane_coordinate,
            parse_plane_coordinate,
            texture_name,
            parse_plane_uv,
            parse_plane_uv,
            double,
            double,
            double,
        )),
        |(p1, p2, p3, texture_name, u, v, rotation, u_scale, v_scale)| BrushPlane {
            p1,
            p2,
            p3,
            texture_name,
            u,
            v,
            rotation,
            u_scale,
            v_scale,
        },
    )(i)
}

fn parse_brush(i: &str) -> IResult<Brush> {
    map(
        many1(terminated(parse_brush_plane, multispace0)),
        |planes| Brush { planes },
    )(i)
}

// For patches
fn parse_patch_point(i: &str) -> IResult<PatchPoint> {
    delimited(
        tuple((multispace0, tag("("))),
        map(
            tuple((double, double, double, double, double)),
            |(x, y, z, u, v)| PatchPoint {
                position: DVec3::new(x, y, z),
                uv: DVec2::new(u, v),
            },
        ),
        tuple((space0, tag(")"))),
    )(i)
}

fn parse_patch_row(i: &str) -> IResult<Vec<PatchPoint>> {
    delimited(
        tuple((multispace0, tag("("))),
        many1(parse_patch_point),
        tuple((multispace0, tag(")"))),
    )(i)
}

fn parse_patch_rows(i: &str) -> IResult<Vec<Vec<PatchPoint>>> {
    delimited(
        tuple((multispace0, tag("("))),
        many1(parse_patch_row),
        tuple((multispace0, tag(")"))),
    )(i)
}

// ( rows columns 0 0 0 )
fn parse_patch_header(i: &str) -> IResult<(usize, usize)> {
    map(
        delimited(
            tuple((multispace0, tag("("))),
            tuple((double, double, double, double, double)),
            tuple((space0, tag(")"))),
        ),
        |(rows, columns, _, _, _)| (rows as usize, columns as usize),
    )(i)
}

fn parse_patch(i: &str) -> IResult<Patch> {
    map(
        verify(
            delimited(
                tuple((tag("patchDef2"), multispace0, tag("{"), multispace0)),
                tuple((texture_name, parse_patch_header, parse_patch_rows)),
                tuple((multispace0, tag("}"), multispace0)),
            ),
            |(_, (rows, columns), points): &(String, (usize, usize), Vec<Vec<PatchPoint>>)| {
                points.len() == *rows && points.iter().all(|row| row.len() == *columns)
            },
        ),
        |(texture_name, (row_count, column_count), rows)| Patch {
            texture_name,
            row_count,
            column_count,
            points: rows.into_iter().flatten().collect(),
        },
    )(i)
}

fn parse_primitive(i: &str) -> IResult<Primitive> {
    alt((
        map(parse_patch, Primitive::Patch),
        map(parse_brush, Primitive::Brush),
    ))(i)
}

fn parse_primitives(i: &str) -> IResult<Vec<Primitive>> {
    many0(delimited(
        discard_comment_lines,
        between_line_bracket(parse_primitive),
        discard_comment_lines,
    ))(i)
}

// For attributes
fn parse_attribute(i: &str) -> IResult<(&str, &str)> {
    tuple((quoted_text, preceded(space0, quoted_text)))(i)
}

fn parse_attributes(i: &str) -> IResult<Attributes> {
    fold_many0(
        terminated(parse_attribute, multispace0),
        Attributes::new,
        |mut acc: Attributes, (key, value)| {
            acc.insert(key, value);
            acc
        },
    )(i)
}

// For map
fn parse_entity(i: &str) -> IResult<Entity> {
    map(
        tuple((parse_attributes, parse_primitives)),
        |(attributes, primitives)| Entity {
            attributes,
            primitives,
        },
    )(i)
}

fn parse_entities(i: &str) -> IResult<Vec<Entity>> {
    many1(delimited(
        discard_comment_lines,
        between_line_bracket(parse_entity),
        discard_comment_lines,
    ))(i)
}

fn parse_map(i: &str) -> IResult<Map> {
    map(
        all_consuming(tuple((
            preceded(multispace0, take_tb_header),
            parse_entities,
        ))),
        |(tb_header, entities)| Map {
            tb_header,
            entities,
        },
    )(i)
}
