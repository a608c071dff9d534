use itertools::Itertools;
use log::debug;

use crate::{
    error::{Error, Result},
    graphs::AdjacencyGraph,
    types::FxIndexSet,
};

/// One node of a tree decomposition, keyed by its eliminated variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeDecompNode {
    node_var: usize,
    sep_vars: Vec<usize>,
    clamped_vars: Vec<usize>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl TreeDecompNode {
    /// Return the variable eliminated at this node.
    ///
    /// # Returns
    ///
    /// The eliminated variable.
    ///
    #[inline]
    pub const fn node_var(&self) -> usize {
        self.node_var
    }

    /// Return the separator shared with the parent scope.
    ///
    /// # Returns
    ///
    /// The separator variables in ascending order.
    ///
    #[inline]
    pub fn sep_vars(&self) -> &[usize] {
        &self.sep_vars
    }

    /// Return the clamped variables hosted at this node.
    ///
    /// # Returns
    ///
    /// The hosted clamped variables in ascending order.
    ///
    #[inline]
    pub fn clamped_vars(&self) -> &[usize] {
        &self.clamped_vars
    }

    /// Return the parent node index.
    ///
    /// # Returns
    ///
    /// The parent, or `None` for a root.
    ///
    #[inline]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Return the child node indices, in elimination order.
    ///
    /// # Returns
    ///
    /// A reference to the children.
    ///
    #[inline]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Return the scope of the node.
    ///
    /// # Returns
    ///
    /// The eliminated variable and the separator, in ascending order.
    ///
    pub fn node_scope(&self) -> Vec<usize> {
        let position = self.sep_vars.partition_point(|&x| x < self.node_var);
        let mut scope = Vec::with_capacity(self.sep_vars.len() + 1);
        scope.extend_from_slice(&self.sep_vars[..position]);
        scope.push(self.node_var);
        scope.extend_from_slice(&self.sep_vars[position..]);

        scope
    }
}

/// A tree decomposition of a factor graph along an elimination order.
///
/// Nodes are stored in an arena indexed by elimination position; parent and
/// child links are arena indices. Variables absent from the order are
/// clamped: they take their value from the initial assignment and are hosted
/// at the root-most node whose residual scope contained them.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeDecomp {
    nodes: Vec<TreeDecompNode>,
    roots: Vec<usize>,
    positions: Vec<Option<usize>>,
    clamped_vars: Vec<usize>,
    complexity: f64,
}

impl TreeDecomp {
    /// Construct a tree decomposition by eliminating the order.
    ///
    /// # Arguments
    ///
    /// * `graph` - The factor graph.
    /// * `order` - The elimination order, a subset of the variables.
    /// * `dom_sizes` - The domain sizes, one per variable.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the order has duplicate or out-of-range
    /// entries, the graph mentions more variables than `dom_sizes`, or a
    /// domain is empty.
    ///
    /// # Returns
    ///
    /// A new `TreeDecomp` instance.
    ///
    pub fn new(graph: &AdjacencyGraph, order: &[usize], dom_sizes: &[usize]) -> Result<Self> {
        let num_vars = dom_sizes.len();

        // Validate the inputs.
        if graph.num_vertices() > num_vars {
            return Err(Error::InvalidArgument(format!(
                "graph has {} vertices but only {} domain sizes are given",
                graph.num_vertices(),
                num_vars
            )));
        }
        if dom_sizes.iter().any(|&d| d == 0) {
            return Err(Error::InvalidArgument(
                "domain sizes must be positive".into(),
            ));
        }
        let mut positions = vec![None; num_vars];
        for (t, &x) in order.iter().enumerate() {
            if x >= num_vars {
                return Err(Error::InvalidArgument(format!(
                    "variable {x} in the elimination order is out of range"
                )));
            }
            if positions[x].replace(t).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "variable {x} appears twice in the elimination order"
                )));
            }
        }

        // Clone the adjacencies into a working copy.
        let mut adjacency: Vec<FxIndexSet<usize>> = (0..num_vars)
            .map(|x| {
                if x < graph.num_vertices() {
                    graph.neighbors(x).iter().copied().collect()
                } else {
                    FxIndexSet::default()
                }
            })
            .collect();

        // Eliminate the order, one node per variable.
        let mut nodes: Vec<TreeDecompNode> = Vec::with_capacity(order.len());
        let mut hosts = vec![None; num_vars];
        for (t, &x) in order.iter().enumerate() {
            let adjacent = adjacency[x].iter().copied().collect_vec();
            // Split the neighborhood into separator and clamped variables.
            let mut sep_vars = Vec::with_capacity(adjacent.len());
            for &y in &adjacent {
                match positions[y] {
                    Some(_) => sep_vars.push(y),
                    None => hosts[y] = Some(t),
                }
            }
            sep_vars.sort_unstable();
            // Connect the elimination clique.
            for (i, &y) in adjacent.iter().enumerate() {
                for &z in &adjacent[i + 1..] {
                    adjacency[y].insert(z);
                    adjacency[z].insert(y);
                }
            }
            // Remove the eliminated variable.
            for &y in &adjacent {
                adjacency[y].swap_remove(&x);
            }
            adjacency[x].clear();

            nodes.push(TreeDecompNode {
                node_var: x,
                sep_vars,
                ..Default::default()
            });
        }

        // Link each node to the first-eliminated variable of its separator.
        let mut roots = Vec::new();
        for t in 0..nodes.len() {
            let parent = nodes[t]
                .sep_vars
                .iter()
                .map(|&y| positions[y].expect("Separator variables are eliminated"))
                .min();
            match parent {
                Some(p) => {
                    nodes[t].parent = Some(p);
                    nodes[p].children.push(t);
                }
                None => roots.push(t),
            }
        }

        // Host each clamped variable at its root-most adjacent node.
        for (y, host) in hosts.iter().enumerate() {
            if let Some(t) = host {
                nodes[*t].clamped_vars.push(y);
            }
        }
        nodes
            .iter_mut()
            .for_each(|node| node.clamped_vars.sort_unstable());

        // The complexity is the largest per-node scope weight.
        let complexity = nodes
            .iter()
            .map(|node| {
                (dom_sizes[node.node_var] as f64).log2()
                    + node
                        .sep_vars
                        .iter()
                        .map(|&y| (dom_sizes[y] as f64).log2())
                        .sum::<f64>()
            })
            .fold(0., f64::max);

        let clamped_vars = (0..num_vars).filter(|&x| positions[x].is_none()).collect();

        debug!(
            "Built tree decomposition: {} nodes, {} roots, complexity {:.3}",
            nodes.len(),
            roots.len(),
            complexity
        );

        Ok(Self {
            nodes,
            roots,
            positions,
            clamped_vars,
            complexity,
        })
    }

    /// Return the nodes of the forest, indexed by elimination position.
    ///
    /// # Returns
    ///
    /// A reference to the nodes.
    ///
    #[inline]
    pub fn nodes(&self) -> &[TreeDecompNode] {
        &self.nodes
    }

    /// Return the root node indices, one per connected component.
    ///
    /// # Returns
    ///
    /// A reference to the roots.
    ///
    #[inline]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Return the elimination position of a variable.
    ///
    /// # Arguments
    ///
    /// * `x` - The variable.
    ///
    /// # Returns
    ///
    /// The position, or `None` if the variable is clamped.
    ///
    #[inline]
    pub fn position(&self, x: usize) -> Option<usize> {
        self.positions[x]
    }

    /// Return the clamped variables, i.e. those absent from the order.
    ///
    /// # Returns
    ///
    /// The clamped variables in ascending order.
    ///
    #[inline]
    pub fn clamped_vars(&self) -> &[usize] {
        &self.clamped_vars
    }

    /// Return the complexity of the decomposition.
    ///
    /// # Returns
    ///
    /// The largest per-node `log2` scope weight, zero without nodes.
    ///
    #[inline]
    pub const fn complexity(&self) -> f64 {
        self.complexity
    }

    /// Traverse a subtree bottom-up.
    ///
    /// # Arguments
    ///
    /// * `root` - The subtree root index.
    ///
    /// # Returns
    ///
    /// The node indices in post-order.
    ///
    pub fn post_order(&self, root: usize) -> Vec<usize> {
        let mut order = self.pre_order(root);
        order.reverse();

        order
    }

    /// Traverse a subtree top-down.
    ///
    /// # Arguments
    ///
    /// * `root` - The subtree root index.
    ///
    /// # Returns
    ///
    /// The node indices in pre-order.
    ///
    pub fn pre_order(&self, root: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(t) = stack.pop() {
            order.push(t);
            stack.extend(self.nodes[t].children.iter().rev());
        }

        order
    }
}
