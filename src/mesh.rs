use glam::Vec3;
use thiserror::Error;

/// Vertex attribute kinds, each bound to a fixed shader location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    Color,
    Normal,
    TexCoord,
}

impl Attribute {
    pub fn location(self) -> u32 {
        match self {
            Self::Position => 0,
            Self::Color | Self::Normal => 1,
            Self::TexCoord => 2,
        }
    }

    pub fn components(self) -> usize {
        match self {
            Self::TexCoord => 2,
            _ => 3,
        }
    }
}

/// Interleaved attribute layout of a mesh, fixed when the mesh is authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    PositionColor,
    PositionNormal,
    PositionTexcoord,
    PositionColorTexcoord,
}

impl VertexLayout {
    pub fn attributes(self) -> &'static [Attribute] {
        use Attribute::*;
        match self {
            Self::PositionColor => &[Position, Color],
            Self::PositionNormal => &[Position, Normal],
            Self::PositionTexcoord => &[Position, TexCoord],
            Self::PositionColorTexcoord => &[Position, Color, TexCoord],
        }
    }

    /// Floats per vertex record.
    pub fn stride(self) -> usize {
        self.attributes().iter().map(|attr| attr.components()).sum()
    }

    pub fn stride_bytes(self) -> u64 {
        (self.stride() * std::mem::size_of::<f32>()) as u64
    }

    /// Float offset of each attribute inside a record, in declaration order.
    pub fn offsets(self) -> impl Iterator<Item = (Attribute, usize)> {
        self.attributes().iter().scan(0, |offset, attr| {
            let current = *offset;
            *offset += attr.components();
            Some((*attr, current))
        })
    }

    pub fn has_location(self, location: u32) -> bool {
        self.attributes()
            .iter()
            .any(|attr| attr.location() == location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("{len} floats do not form whole {stride}-float vertices")]
    RaggedVertexData { len: usize, stride: usize },
    #[error("{len} indices do not form whole triangles")]
    PartialTriangle { len: usize },
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },
}

/// Interleaved vertex data plus triangle indices, validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    layout: VertexLayout,
    vertices: Vec<f32>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(layout: VertexLayout, vertices: Vec<f32>, indices: Vec<u32>) -> Result<Self, MeshError> {
        let stride = layout.stride();
        if vertices.len() % stride != 0 {
            return Err(MeshError::RaggedVertexData {
                len: vertices.len(),
                stride,
            });
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle { len: indices.len() });
        }
        let vertex_count = vertices.len() / stride;
        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, index)| **index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                position,
                vertex_count,
            });
        }

        Ok(Self {
            layout,
            vertices,
            indices,
        })
    }

    pub fn from_tables(layout: VertexLayout, vertices: &[f32], indices: &[u32]) -> Result<Self, MeshError> {
        Self::new(layout, vertices.to_vec(), indices.to_vec())
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.stride()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Position of vertex `index`. Panics when out of range.
    pub fn position(&self, index: usize) -> Vec3 {
        let start = index * self.layout.stride();
        Vec3::from_slice(&self.vertices[start..start + 3])
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }
}
