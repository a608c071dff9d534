use itertools::Itertools;

/// A symmetric adjacency structure over densely indexed vertices.
///
/// Stored compactly as per-vertex offsets into a sorted neighbor array.
/// Self-loops are ignored and duplicate edges collapse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
}

impl AdjacencyGraph {
    /// Construct a new graph from an iterable of edges.
    ///
    /// # Arguments
    ///
    /// * `edges` - An iterator over `(x, y)` vertex pairs; both orientations
    ///   are stored.
    /// * `min_vertices` - A lower bound on the vertex count, raising it above
    ///   the largest referenced vertex.
    ///
    /// # Returns
    ///
    /// A new `AdjacencyGraph` instance.
    ///
    pub fn new<I>(edges: I, min_vertices: usize) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        // Collect both orientations, dropping self-loops.
        let mut adjacency: Vec<Vec<usize>> = Vec::new();
        for (x, y) in edges {
            if x == y {
                continue;
            }
            if adjacency.len() <= usize::max(x, y) {
                adjacency.resize(usize::max(x, y) + 1, Vec::new());
            }
            adjacency[x].push(y);
            adjacency[y].push(x);
        }
        if adjacency.len() < min_vertices {
            adjacency.resize(min_vertices, Vec::new());
        }

        // Sort and deduplicate each neighborhood, then flatten.
        let mut offsets = Vec::with_capacity(adjacency.len() + 1);
        offsets.push(0);
        let neighbors = adjacency
            .into_iter()
            .flat_map(|mut adjacent| {
                adjacent.sort_unstable();
                adjacent.dedup();
                offsets.push(offsets.last().unwrap() + adjacent.len());
                adjacent
            })
            .collect_vec();

        Self { offsets, neighbors }
    }

    /// Return the number of vertices.
    ///
    /// # Returns
    ///
    /// The vertex count.
    ///
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Return the degree of a vertex.
    ///
    /// # Arguments
    ///
    /// * `x` - The vertex.
    ///
    /// # Panics
    ///
    /// * If the vertex is out of bounds.
    ///
    /// # Returns
    ///
    /// The number of neighbors.
    ///
    #[inline]
    pub fn degree(&self, x: usize) -> usize {
        self.neighbors(x).len()
    }

    /// Return the neighbors of a vertex.
    ///
    /// # Arguments
    ///
    /// * `x` - The vertex.
    ///
    /// # Panics
    ///
    /// * If the vertex is out of bounds.
    ///
    /// # Returns
    ///
    /// The neighbors in ascending order.
    ///
    pub fn neighbors(&self, x: usize) -> &[usize] {
        assert!(x < self.num_vertices(), "Vertex {} index out of bounds", x);

        &self.neighbors[self.offsets[x]..self.offsets[x + 1]]
    }
}
