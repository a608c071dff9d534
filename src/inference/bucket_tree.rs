use itertools::Itertools;
use log::debug;
use ndarray::prelude::*;
use rand::RngCore;

use crate::{
    decompositions::TreeDecomp,
    error::{Error, Result},
    semirings::{LogSumProduct, Semiring, Solution, SolvableMarginalizer},
    tables::{Merger, Table},
};

use super::Task;

/// The per-node state of a bucket tree.
struct BucketNode<S: Semiring> {
    base: Vec<Table<S::Value>>,
    lambda: Option<Table<S::Value>>,
    pi: Option<Table<S::Value>>,
    marginalizer: Option<Box<dyn SolvableMarginalizer<S::Value, S::Solution>>>,
}

impl<S: Semiring> BucketNode<S> {
    fn new() -> Self {
        Self {
            base: Vec::new(),
            lambda: None,
            pi: None,
            marginalizer: None,
        }
    }
}

/// The retained tables of one bucket-tree node.
#[derive(Clone, Copy, Debug)]
pub struct NodeTables<'b, Y> {
    /// The conditioned base tables attached to the node.
    pub base: &'b [Table<Y>],
    /// The upward message sent to the parent, over the separator.
    pub lambda: Option<&'b Table<Y>>,
    /// The downward message received from the parent, over the separator.
    pub pi: Option<&'b Table<Y>>,
}

/// The two-pass bucket elimination engine.
///
/// The upward pass runs at construction: every node merges its base tables
/// with the messages of its children and collapses its variable into the
/// message sent to its parent. The downward pass runs on demand through
/// [`BucketTree::solve`], reading the state recorded by the solvable
/// marginalizers; it may be repeated, re-using the cached upward pass.
pub struct BucketTree<'a, S: Semiring> {
    task: &'a Task<'a, S>,
    decomp: &'a TreeDecomp,
    x0: Vec<usize>,
    solvable: bool,
    retain: bool,
    nodes: Vec<BucketNode<S>>,
    problem_value: S::Value,
    merger: Merger<S::Value>,
}

impl<'a, S: Semiring> BucketTree<'a, S> {
    /// Construct a bucket tree and run the upward pass.
    ///
    /// # Arguments
    ///
    /// * `task` - The bound task.
    /// * `decomp` - The validated tree decomposition.
    /// * `x0` - The initial assignment, one domain index per variable; only
    ///   clamped entries are consulted.
    /// * `solvable` - Record the per-node state needed by [`BucketTree::solve`].
    /// * `retain` - Keep the per-node tables for marginal extraction.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `x0` has the wrong length or an entry
    /// out of its domain, or any error of the semiring's marginalizers.
    ///
    /// # Returns
    ///
    /// A new `BucketTree` instance with the upward pass completed.
    ///
    pub fn new(
        task: &'a Task<'a, S>,
        decomp: &'a TreeDecomp,
        x0: &[usize],
        solvable: bool,
        retain: bool,
    ) -> Result<Self> {
        if x0.len() != task.num_vars() {
            return Err(Error::InvalidArgument(format!(
                "initial assignment has length {}, expected {}",
                x0.len(),
                task.num_vars()
            )));
        }
        if let Some((x, &value)) = x0
            .iter()
            .enumerate()
            .find(|&(x, &value)| value >= task.dom_size(x))
        {
            return Err(Error::InvalidArgument(format!(
                "initial assignment {value} is out of the domain of variable {x}"
            )));
        }

        let dom_sizes = task.dom_sizes();
        let mut nodes: Vec<BucketNode<S>> = (0..decomp.nodes().len())
            .map(|_| BucketNode::new())
            .collect();
        let mut merger = Merger::new();

        // Upward pass: merge each bucket and send the message to the parent.
        for &root in decomp.roots() {
            for t in decomp.post_order(root) {
                let node = &decomp.nodes()[t];

                // Condition the clamped variables out of the attached tables.
                let base = task.base_tables(decomp, t, x0)?;

                let out_scope = node
                    .sep_vars()
                    .iter()
                    .map(|&x| (x, dom_sizes[x]))
                    .collect_vec();
                let elim_dom_size = dom_sizes[node.node_var()];

                let mut solvable_marginalizer = if solvable {
                    let sep_dom_sizes = node
                        .sep_vars()
                        .iter()
                        .map(|&x| dom_sizes[x])
                        .collect_vec();
                    Some(task.ops().solvable_marginalizer(
                        node.sep_vars(),
                        &sep_dom_sizes,
                        node.node_var(),
                        elim_dom_size,
                    )?)
                } else {
                    None
                };

                let lambda = {
                    let inputs: Vec<&Table<S::Value>> = base
                        .iter()
                        .chain(node.children().iter().map(|&c| {
                            nodes[c]
                                .lambda
                                .as_ref()
                                .expect("Children are processed before their parent")
                        }))
                        .collect();
                    match &mut solvable_marginalizer {
                        Some(marginalizer) => merger.merge(
                            task.ops(),
                            &inputs,
                            &out_scope,
                            node.node_var(),
                            elim_dom_size,
                            marginalizer,
                        )?,
                        None => {
                            let mut marginalizer = task.ops().marginalizer()?;
                            merger.merge(
                                task.ops(),
                                &inputs,
                                &out_scope,
                                node.node_var(),
                                elim_dom_size,
                                &mut *marginalizer,
                            )?
                        }
                    }
                };

                // Consumed child messages are only kept for retention.
                if !retain {
                    for &c in node.children() {
                        nodes[c].lambda = None;
                    }
                }
                nodes[t].lambda = Some(lambda);
                nodes[t].marginalizer = solvable_marginalizer;
                if retain {
                    nodes[t].base = base;
                }
            }
        }

        // Combine the root scalars with the clamped contributions.
        let root_values = decomp
            .roots()
            .iter()
            .map(|&root| {
                nodes[root]
                    .lambda
                    .as_ref()
                    .expect("Roots keep their message")[0]
                    .clone()
            })
            .collect_vec();
        let problem_value = task.problem_value(decomp, &root_values, x0);

        debug!(
            "Completed upward pass over {} nodes ({} roots)",
            nodes.len(),
            decomp.roots().len()
        );

        Ok(Self {
            task,
            decomp,
            x0: x0.to_vec(),
            solvable,
            retain,
            nodes,
            problem_value,
            merger,
        })
    }

    /// Return the problem value.
    ///
    /// For minimization this is the global minimum, for log-sum-product the
    /// log partition function, for counting minimization the minimum paired
    /// with its attainment count.
    ///
    /// # Returns
    ///
    /// A reference to the combined root and clamped contributions.
    ///
    #[inline]
    pub const fn problem_value(&self) -> &S::Value {
        &self.problem_value
    }

    /// Run the downward pass, producing a solution object.
    ///
    /// Repeated calls re-use the upward pass and its recorded per-node
    /// state; only the downward traversal is repeated.
    ///
    /// # Arguments
    ///
    /// * `rng` - The uniform `[0, 1)` source, unused by deterministic
    ///   semirings.
    ///
    /// # Errors
    ///
    /// [`Error::OperationUnavailable`] if the tree was built without solve
    /// support.
    ///
    /// # Returns
    ///
    /// The semiring-specific solution.
    ///
    pub fn solve(&self, rng: &mut dyn RngCore) -> Result<S::Solution> {
        if !self.solvable {
            return Err(Error::OperationUnavailable(
                "the bucket tree was built without solve support",
            ));
        }

        let mut solution = self.task.ops().init_solution(self.task.dom_sizes())?;
        // Clamped variables take their value from the initial assignment.
        for &x in self.decomp.clamped_vars() {
            solution.assign(x, self.x0[x]);
        }
        solution.seed(&self.problem_value);

        // Downward pass: every node completes the partial solution.
        for &root in self.decomp.roots() {
            for t in self.decomp.pre_order(root) {
                self.nodes[t]
                    .marginalizer
                    .as_ref()
                    .ok_or_else(|| {
                        Error::InternalError("solvable node is missing its marginalizer".into())
                    })?
                    .solve(&mut solution, rng)?;
            }
        }

        Ok(solution)
    }

    /// Return the retained tables of a node.
    ///
    /// # Arguments
    ///
    /// * `node` - The node index.
    ///
    /// # Errors
    ///
    /// [`Error::OperationUnavailable`] if the tree was built without table
    /// retention.
    ///
    /// # Returns
    ///
    /// The base, lambda and pi tables of the node.
    ///
    pub fn node_tables(&self, node: usize) -> Result<NodeTables<'_, S::Value>> {
        if !self.retain {
            return Err(Error::OperationUnavailable(
                "the bucket tree was built without table retention",
            ));
        }

        Ok(NodeTables {
            base: &self.nodes[node].base,
            lambda: self.nodes[node].lambda.as_ref(),
            pi: self.nodes[node].pi.as_ref(),
        })
    }
}

/// The normalized marginals extracted from a bucket tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Marginals {
    /// One `(variable, distribution)` entry per node.
    pub unary: Vec<(usize, Array1<f64>)>,
    /// One `((variable, separator variable), distribution)` entry per
    /// node-separator pair, rows indexed by the first variable.
    pub pairwise: Vec<((usize, usize), Array2<f64>)>,
}

impl<'a> BucketTree<'a, LogSumProduct> {
    /// Extract the unary and pairwise marginals of the Gibbs distribution.
    ///
    /// The downward messages are computed from each parent's tables with the
    /// child's own message excluded, then every node normalizes its local
    /// joint onto its variable and its separator pairs.
    ///
    /// # Errors
    ///
    /// [`Error::OperationUnavailable`] if the tree was built without table
    /// retention.
    ///
    /// # Returns
    ///
    /// The marginals, one unary entry per node and one pairwise entry per
    /// node-separator pair.
    ///
    pub fn marginals(&mut self) -> Result<Marginals> {
        if !self.retain {
            return Err(Error::OperationUnavailable(
                "the bucket tree was built without table retention",
            ));
        }

        let ops = LogSumProduct::new();
        let dom_sizes = self.task.dom_sizes().to_vec();

        // Downward pass: send each child its message.
        let order = self
            .decomp
            .roots()
            .iter()
            .flat_map(|&root| self.decomp.pre_order(root))
            .collect_vec();
        for &t in &order {
            let node = &self.decomp.nodes()[t];
            let scope = node
                .node_scope()
                .into_iter()
                .map(|x| (x, dom_sizes[x]))
                .collect_vec();
            for &c in node.children() {
                let pi = {
                    let inputs: Vec<&Table<f64>> = self.nodes[t]
                        .base
                        .iter()
                        .chain(
                            node.children()
                                .iter()
                                .filter(|&&s| s != c)
                                .map(|&s| self.nodes[s].lambda.as_ref().expect("Messages are retained")),
                        )
                        .chain(self.nodes[t].pi.as_ref())
                        .collect();
                    let joint = self.merger.product(&ops, &inputs, &scope)?;
                    reduce_onto(
                        &mut self.merger,
                        joint,
                        self.decomp.nodes()[c].sep_vars(),
                        &dom_sizes,
                    )?
                };
                self.nodes[c].pi = Some(pi);
            }
        }

        // Normalize each node's local joint onto its variable and pairs.
        let mut marginals = Marginals::default();
        for &t in &order {
            let node = &self.decomp.nodes()[t];
            let scope = node
                .node_scope()
                .into_iter()
                .map(|x| (x, dom_sizes[x]))
                .collect_vec();
            let joint = {
                let inputs: Vec<&Table<f64>> = self.nodes[t]
                    .base
                    .iter()
                    .chain(
                        node.children()
                            .iter()
                            .map(|&c| self.nodes[c].lambda.as_ref().expect("Messages are retained")),
                    )
                    .chain(self.nodes[t].pi.as_ref())
                    .collect();
                self.merger.product(&ops, &inputs, &scope)?
            };

            let x = node.node_var();
            let unary = reduce_onto(&mut self.merger, joint.clone(), &[x], &dom_sizes)?;
            marginals.unary.push((x, normalize(unary.values())));

            for &s in node.sep_vars() {
                let keep = if x < s { [x, s] } else { [s, x] };
                let pair = reduce_onto(&mut self.merger, joint.clone(), &keep, &dom_sizes)?;
                let p = normalize(pair.values());
                // Orient the distribution with the node variable on rows.
                let (rows, cols) = (dom_sizes[x], dom_sizes[s]);
                let p = Array2::from_shape_fn((rows, cols), |(i, j)| {
                    if x < s {
                        p[i + rows * j]
                    } else {
                        p[j + cols * i]
                    }
                });
                marginals.pairwise.push(((x, s), p));
            }
        }

        Ok(marginals)
    }
}

/// Collapse a table onto the kept variables, one elimination at a time.
fn reduce_onto(
    merger: &mut Merger<f64>,
    table: Table<f64>,
    keep: &[usize],
    dom_sizes: &[usize],
) -> Result<Table<f64>> {
    let ops = LogSumProduct::new();
    let mut current = table;
    while let Some(x) = current.vars().iter().copied().find(|x| !keep.contains(x)) {
        let out_scope = current
            .vars()
            .iter()
            .copied()
            .filter(|&y| y != x)
            .map(|y| (y, dom_sizes[y]))
            .collect_vec();
        let mut marginalizer = ops.marginalizer()?;
        current = merger.merge(
            &ops,
            &[&current],
            &out_scope,
            x,
            dom_sizes[x],
            &mut *marginalizer,
        )?;
    }

    Ok(current)
}

/// Exponentiate and normalize a log-space distribution.
fn normalize(values: &Array1<f64>) -> Array1<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights = values.mapv(|x| (x - max).exp());
    let total = weights.sum();

    weights / total
}
