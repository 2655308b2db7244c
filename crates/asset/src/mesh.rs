//! CPU-side model representation produced by the OBJ loader.

/// Floats per interleaved vertex: position (3) + texcoord (2) + normal (3).
pub const FLOATS_PER_VERTEX: usize = 8;
/// Byte stride of one interleaved vertex.
pub const VERTEX_STRIDE_BYTES: usize = FLOATS_PER_VERTEX * std::mem::size_of::<f32>();

/// Attribute offsets inside a vertex, in floats.
pub const POSITION_OFFSET: usize = 0;
pub const TEXCOORD_OFFSET: usize = 3;
pub const NORMAL_OFFSET: usize = 5;

/// One vertex viewed out of the flat buffer. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }

    fn from_slice(chunk: &[f32]) -> Self {
        let p = &chunk[POSITION_OFFSET..TEXCOORD_OFFSET];
        let t = &chunk[TEXCOORD_OFFSET..NORMAL_OFFSET];
        let n = &chunk[NORMAL_OFFSET..FLOATS_PER_VERTEX];
        Self::new([p[0], p[1], p[2]], [t[0], t[1]], [n[0], n[1], n[2]])
    }
}

/// Flattened, non-indexed triangle list.
///
/// `buffer` holds one interleaved vertex per emitted face corner and can be uploaded
/// as-is; `indices` is the running corner count and only used for sizing the draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelData {
    pub indices: Vec<u32>,
    pub buffer: Vec<f32>,
}

impl ModelData {
    pub fn new(indices: Vec<u32>, buffer: Vec<f32>) -> Self {
        Self { indices, buffer }
    }

    /// Append one corner: position, then texcoord, then normal.
    pub(crate) fn push_corner(&mut self, position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) {
        let next = self.indices.len() as u32;
        self.buffer.extend_from_slice(&position);
        self.buffer.extend_from_slice(&uv);
        self.buffer.extend_from_slice(&normal);
        self.indices.push(next);
    }

    /// Number of vertices to draw.
    pub fn vertex_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Size of the vertex buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.buffer.len() * std::mem::size_of::<f32>()
    }

    pub fn vertices(&self) -> impl Iterator<Item = MeshVertex> + '_ {
        self.buffer
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(MeshVertex::from_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_corner_interleaves_attributes() {
        let mut data = ModelData::default();
        data.push_corner([1.0, 2.0, 3.0], [0.25, 0.75], [0.0, 1.0, 0.0]);
        data.push_corner([4.0, 5.0, 6.0], [0.5, 0.5], [1.0, 0.0, 0.0]);

        assert_eq!(data.indices, vec![0, 1]);
        assert_eq!(data.buffer.len(), 2 * FLOATS_PER_VERTEX);
        assert_eq!(data.byte_len(), 2 * VERTEX_STRIDE_BYTES);
        assert_eq!(&data.buffer[..8], &[1.0, 2.0, 3.0, 0.25, 0.75, 0.0, 1.0, 0.0]);

        let second = data.vertices().nth(1).unwrap();
        assert_eq!(second, MeshVertex::new([4.0, 5.0, 6.0], [0.5, 0.5], [1.0, 0.0, 0.0]));
    }

    #[test]
    fn stride_is_32_bytes() {
        assert_eq!(VERTEX_STRIDE_BYTES, 32);
        assert_eq!(TEXCOORD_OFFSET * 4, 12);
        assert_eq!(NORMAL_OFFSET * 4, 20);
    }
}
