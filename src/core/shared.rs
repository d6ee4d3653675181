use indexmap::IndexMap;

/// Index of a vertex. Faces and prediction contexts are expressed with it.
pub type VertexIdx = u32;

/// A triangle as three vertex indices in counter-clockwise order.
pub type Face = [VertexIdx; 3];

pub trait ConfigType {
    fn default() -> Self;
}

/// Prediction context of one vertex: the vertex itself and three already known
/// vertices it is predicted from. When `a != b` the triple forms a parallelogram
/// `a - b + c`, otherwise the vertex is predicted from `a` alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Quad {
    pub target: VertexIdx,
    pub a: VertexIdx,
    pub b: VertexIdx,
    pub c: VertexIdx,
}

impl Quad {
    pub fn new(target: VertexIdx, a: VertexIdx, b: VertexIdx, c: VertexIdx) -> Self {
        Self { target, a, b, c }
    }

    /// a context predicting `target` from the vertex right before it.
    /// Vertex 0 gets the origin context, whose value is stored raw.
    pub fn chain(target: VertexIdx) -> Self {
        let prev = target.saturating_sub(1);
        Self { target, a: prev, b: prev, c: prev }
    }

    #[inline]
    pub fn is_parallelogram(&self) -> bool {
        self.a != self.b
    }
}

/// A run of faces sharing string properties. `end` is one past the last face of the group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    pub end: u32,
    pub properties: IndexMap<String, String>,
}

impl Group {
    pub fn new(end: u32) -> Self {
        Self { end, properties: IndexMap::new() }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
