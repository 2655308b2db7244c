//! OBJ geometry loader: positions, texture coordinates, normals and faces.
//!
//! Faces are expanded corner by corner into an interleaved vertex buffer. Shared
//! corners are written again every time a face references them.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow};

use crate::mesh::ModelData;

/// Texcoord used when a face corner has no `vt` reference.
const DEFAULT_UV: [f32; 2] = [0.0, 0.0];
/// Normal used when a face corner has no `vn` reference.
const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Load an OBJ model from a file path.
pub fn load_model_from_path(path: impl AsRef<Path>) -> Result<ModelData> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    let model = load_model_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse OBJ file: {}", path.display()))?;
    log::info!(
        "Loaded model {}: {} corners, {} floats",
        path.display(),
        model.indices.len(),
        model.buffer.len()
    );
    Ok(model)
}

/// Load an OBJ model from a [`BufRead`] implementation.
pub fn load_model_from_reader<R: BufRead>(reader: R) -> Result<ModelData> {
    parse_obj(reader)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_model_from_str(contents: &str) -> Result<ModelData> {
    parse_obj(io::Cursor::new(contents))
}

/// One face corner, resolved to 0-based indices.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Corner {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

fn parse_obj<R: BufRead>(reader: R) -> Result<ModelData> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    let mut model = ModelData::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let tag = parts
            .next()
            .ok_or_else(|| anyhow!("Malformed OBJ line {}: '{}'", line_no + 1, trimmed))?;

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                normals.push([nx, ny, nz]);
            }
            "f" => {
                let corners = parts
                    .map(|part| {
                        parse_face_corner(
                            part,
                            positions.len(),
                            texcoords.len(),
                            normals.len(),
                            line_no,
                        )
                    })
                    .collect::<Result<Vec<Corner>>>()?;

                if corners.len() < 3 {
                    log::warn!(
                        "Skipping face with {} corner(s) on line {}",
                        corners.len(),
                        line_no + 1
                    );
                    continue;
                }
                // Triangulate fan
                for tri in 1..(corners.len() - 1) {
                    for corner in [corners[0], corners[tri], corners[tri + 1]] {
                        let position = positions[corner.position];
                        let uv = corner.texcoord.map_or(DEFAULT_UV, |i| texcoords[i]);
                        let normal = corner.normal.map_or(DEFAULT_NORMAL, |i| normals[i]);
                        model.push_corner(position, uv, normal);
                    }
                }
            }
            _ => {
                // Ignore other directives (o/g/s/usemtl/mtllib/etc.)
            }
        }
    }

    Ok(model)
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32> {
    let token = value.ok_or_else(|| anyhow!("Missing {} on line {}", what, line_no + 1))?;
    token
        .parse::<f32>()
        .with_context(|| format!("Failed to parse {} on line {}", what, line_no + 1))
}

/// Parse `v`, `v/vt`, `v//vn` or `v/vt/vn`. Indices are checked against the lists read so far.
fn parse_face_corner(
    token: &str,
    pos_count: usize,
    tex_count: usize,
    norm_count: usize,
    line_no: usize,
) -> Result<Corner> {
    let mut split = token.split('/');
    let pos = split
        .next()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("Malformed face element '{}' on line {}", token, line_no + 1))?;
    let position = resolve_index(pos, pos_count, line_no)?;

    let texcoord = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, tex_count, line_no)?),
        _ => None,
    };

    let normal = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, norm_count, line_no)?),
        _ => None,
    };

    if split.next().is_some() {
        anyhow::bail!(
            "Face element '{}' has more than three indices on line {}",
            token,
            line_no + 1
        );
    }

    Ok(Corner {
        position,
        texcoord,
        normal,
    })
}

fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw = token
        .parse::<i64>()
        .with_context(|| format!("Invalid index '{}' on line {}", token, line_no + 1))?;
    if raw == 0 {
        anyhow::bail!("OBJ indices are 1-based; found 0 on line {}", line_no + 1);
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        anyhow::bail!(
            "OBJ index {} resolved out of bounds (len={}) on line {}",
            raw,
            len,
            line_no + 1
        );
    }

    Ok(idx as usize)
}
