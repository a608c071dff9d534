use itertools::Itertools;
use log::debug;

use crate::{
    decompositions::TreeDecomp,
    error::{Error, Result},
    graphs::AdjacencyGraph,
    semirings::{MinSum, Semiring},
    tables::Table,
};

/// A set of input tables bound to a semiring.
///
/// Construction derives the variable universe, the per-variable domain
/// sizes, and the factor graph; it never invokes the semiring's algebra, so
/// the inert semiring can be used to expose the graph to the ordering
/// algorithm.
#[derive(Clone, Debug)]
pub struct Task<'a, S: Semiring> {
    ops: S,
    tables: &'a [Table<S::Value>],
    num_vars: usize,
    dom_sizes: Vec<usize>,
    graph: AdjacencyGraph,
}

impl<'a, S: Semiring> Task<'a, S> {
    /// Construct a new task from input tables.
    ///
    /// # Arguments
    ///
    /// * `tables` - The input factor tables, shared for the task lifetime.
    /// * `ops` - The semiring.
    /// * `min_num_vars` - A lower bound on the variable count, raising it
    ///   above the largest scope variable; the extra variables get domain
    ///   size one.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if two tables disagree on the domain size
    /// of a shared variable.
    ///
    /// # Returns
    ///
    /// A new `Task` instance.
    ///
    pub fn new(tables: &'a [Table<S::Value>], ops: S, min_num_vars: usize) -> Result<Self> {
        // Derive the variable universe.
        let num_vars = tables
            .iter()
            .flat_map(|table| table.vars().iter().copied())
            .max()
            .map_or(0, |x| x + 1)
            .max(min_num_vars);

        // Derive the domain sizes, checking consistency across tables.
        let mut dom_sizes: Vec<Option<usize>> = vec![None; num_vars];
        for table in tables {
            for (i, &x) in table.vars().iter().enumerate() {
                let dom_size = table.dom_sizes()[i];
                match dom_sizes[x] {
                    None => dom_sizes[x] = Some(dom_size),
                    Some(d) if d == dom_size => {}
                    Some(d) => {
                        return Err(Error::InvalidArgument(format!(
                            "tables disagree on the domain size of variable {x}: \
                             {d} and {dom_size}"
                        )))
                    }
                }
            }
        }
        // Unmentioned variables get a trivial domain.
        let dom_sizes = dom_sizes.into_iter().map(|d| d.unwrap_or(1)).collect();

        // Build the factor graph from the pairwise scope edges.
        let edges = tables
            .iter()
            .flat_map(|table| table.vars().iter().copied().tuple_combinations());
        let graph = AdjacencyGraph::new(edges, num_vars);

        debug!(
            "Bound task: {} tables, {} variables",
            tables.len(),
            num_vars
        );

        Ok(Self {
            ops,
            tables,
            num_vars,
            dom_sizes,
            graph,
        })
    }

    /// Return the semiring.
    ///
    /// # Returns
    ///
    /// A reference to the semiring.
    ///
    #[inline]
    pub const fn ops(&self) -> &S {
        &self.ops
    }

    /// Return the input tables.
    ///
    /// # Returns
    ///
    /// The borrowed tables.
    ///
    #[inline]
    pub const fn tables(&self) -> &'a [Table<S::Value>] {
        self.tables
    }

    /// Return the number of variables.
    ///
    /// # Returns
    ///
    /// The variable count.
    ///
    #[inline]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Return the domain size of a variable.
    ///
    /// # Arguments
    ///
    /// * `x` - The variable.
    ///
    /// # Returns
    ///
    /// The domain size.
    ///
    #[inline]
    pub fn dom_size(&self, x: usize) -> usize {
        self.dom_sizes[x]
    }

    /// Return the domain sizes of all variables.
    ///
    /// # Returns
    ///
    /// A reference to the domain sizes.
    ///
    #[inline]
    pub fn dom_sizes(&self) -> &[usize] {
        &self.dom_sizes
    }

    /// Return the factor graph.
    ///
    /// # Returns
    ///
    /// A reference to the graph.
    ///
    #[inline]
    pub const fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    /// Attach each table to a node of a tree decomposition.
    ///
    /// A table is attached to the deepest node whose eliminated variable is
    /// in its scope; tables whose scope is entirely clamped, including the
    /// empty scope, are attached to no node.
    ///
    /// # Arguments
    ///
    /// * `decomp` - The tree decomposition.
    ///
    /// # Returns
    ///
    /// Per-node table indices, and the indices of the unattached tables.
    ///
    pub fn attachments(&self, decomp: &TreeDecomp) -> (Vec<Vec<usize>>, Vec<usize>) {
        let mut per_node = vec![Vec::new(); decomp.nodes().len()];
        let mut clamped_only = Vec::new();

        for (i, table) in self.tables.iter().enumerate() {
            let node = table
                .vars()
                .iter()
                .filter_map(|&x| decomp.position(x))
                .min();
            match node {
                Some(t) => per_node[t].push(i),
                None => clamped_only.push(i),
            }
        }

        (per_node, clamped_only)
    }

    /// Return the base tables of a node under an initial assignment.
    ///
    /// Clamped variables are conditioned out of every attached table, so the
    /// returned scopes are subsets of the node scope.
    ///
    /// # Arguments
    ///
    /// * `decomp` - The tree decomposition.
    /// * `node` - The node index.
    /// * `x0` - The initial assignment, one domain index per variable.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if a clamped entry of `x0` is out of its
    /// domain.
    ///
    /// # Returns
    ///
    /// The conditioned tables attached to the node.
    ///
    pub fn base_tables(
        &self,
        decomp: &TreeDecomp,
        node: usize,
        x0: &[usize],
    ) -> Result<Vec<Table<S::Value>>> {
        self.tables
            .iter()
            .filter(|table| {
                table
                    .vars()
                    .iter()
                    .filter_map(|&x| decomp.position(x))
                    .min()
                    == Some(node)
            })
            .map(|table| {
                let clamped = table
                    .vars()
                    .iter()
                    .copied()
                    .filter(|&x| decomp.position(x).is_none())
                    .map(|x| (x, x0[x]))
                    .collect_vec();
                table.condition(clamped)
            })
            .collect()
    }

    /// Combine the root values with the clamped factor contributions.
    ///
    /// # Arguments
    ///
    /// * `decomp` - The tree decomposition.
    /// * `root_values` - One value per root of the bucket tree.
    /// * `x0` - The initial assignment, one domain index per variable.
    ///
    /// # Returns
    ///
    /// The problem value.
    ///
    pub fn problem_value(
        &self,
        decomp: &TreeDecomp,
        root_values: &[S::Value],
        x0: &[usize],
    ) -> S::Value {
        let mut value = self.ops.combine_identity();
        for root_value in root_values {
            value = self.ops.combine(&value, root_value);
        }
        // Fold in the factors that depend on clamped variables only.
        let (_, clamped_only) = self.attachments(decomp);
        for i in clamped_only {
            value = self.ops.combine(&value, self.tables[i].eval(x0));
        }

        value
    }
}

impl<'a> Task<'a, MinSum> {
    /// Set the number of lowest-cost assignments to recover.
    ///
    /// # Arguments
    ///
    /// * `k` - The number of solutions.
    ///
    pub fn set_max_solutions(&mut self, k: usize) {
        self.ops.set_max_solutions(k);
    }
}
