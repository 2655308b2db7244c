//! Asset loading/parsers (meshes, textures).
//! OBJ geometry flattened into an interleaved vertex buffer, plus RGBA8 texture decoding.

pub mod mesh;
pub mod obj;
pub mod texture;
