use ndarray::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    decompositions::TreeDecomp,
    error::{Error, Result},
    semirings::{CountMin, CountedValue, LogSumProduct, MinSum, Semiring},
    tables::Table,
};

use super::{BucketTree, Marginals, Task};

/// The output of a sampling query.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleResult {
    /// The log partition function of the Gibbs distribution.
    pub log_partition: f64,
    /// The drawn assignments, one row per sample.
    pub samples: Array2<usize>,
    /// The marginals, when requested.
    pub marginals: Option<Marginals>,
}

/// Compute the global minimum and up to `max_solutions` best assignments.
///
/// # Arguments
///
/// * `tables` - The input factor tables.
/// * `order` - The elimination order; absent variables are clamped.
/// * `max_complexity` - The complexity bound on the decomposition.
/// * `max_solutions` - The number of assignments to recover; zero skips the
///   downward pass and returns the minimum value alone.
/// * `x0` - The initial assignment: empty for all zeros, or one entry per
///   variable; only clamped entries are consulted.
/// * `min_num_vars` - A lower bound on the variable count.
///
/// # Errors
///
/// [`Error::InvalidArgument`] on a malformed order or assignment,
/// [`Error::ExcessiveComplexity`] if the decomposition exceeds the bound.
///
/// # Returns
///
/// The energies in ascending order, ties broken lexicographically by
/// assignment, and the matching assignments one per row.
///
pub fn optimize(
    tables: &[Table<f64>],
    order: &[usize],
    max_complexity: f64,
    max_solutions: usize,
    x0: &[usize],
    min_num_vars: usize,
) -> Result<(Vec<f64>, Array2<usize>)> {
    let mut ops = MinSum::new();
    ops.set_max_solutions(max_solutions.max(1));

    let task = Task::new(tables, ops, min_num_vars)?;
    let x0 = expand_x0(x0, task.dom_sizes())?;
    let decomp = build_decomp(&task, order, max_complexity)?;

    let solvable = max_solutions > 0;
    let tree = BucketTree::new(&task, &decomp, &x0, solvable, false)?;
    if !solvable {
        // Without solutions the minimum value is the whole answer.
        return Ok((
            vec![*tree.problem_value()],
            Array2::zeros((0, task.num_vars())),
        ));
    }

    // The minimization semiring draws nothing.
    let mut rng = StdRng::seed_from_u64(0);
    let solution = tree.solve(&mut rng)?;

    let energies = solution.items().iter().map(|item| item.value()).collect();
    let mut states = Array2::zeros((solution.items().len(), task.num_vars()));
    for (i, item) in solution.items().iter().enumerate() {
        states
            .row_mut(i)
            .iter_mut()
            .zip(item.assignment())
            .for_each(|(cell, &value)| *cell = value);
    }

    Ok((energies, states))
}

/// Compute the log partition function and draw exact samples.
///
/// # Arguments
///
/// * `tables` - The input factor tables, holding log-space weights.
/// * `order` - The elimination order; absent variables are clamped.
/// * `max_complexity` - The complexity bound on the decomposition.
/// * `num_samples` - The number of assignments to draw; zero computes the
///   log partition function alone.
/// * `x0` - The initial assignment: empty for all zeros, or one entry per
///   variable; only clamped entries are consulted.
/// * `min_num_vars` - A lower bound on the variable count.
/// * `rng` - The uniform `[0, 1)` source; identical seeds reproduce the
///   samples.
/// * `return_marginals` - Also extract the unary and pairwise marginals.
///
/// # Errors
///
/// [`Error::InvalidArgument`] on a malformed order or assignment,
/// [`Error::ExcessiveComplexity`] if the decomposition exceeds the bound.
///
/// # Returns
///
/// The log partition function, the samples, and the optional marginals.
///
#[allow(clippy::too_many_arguments)]
pub fn sample<R: Rng>(
    tables: &[Table<f64>],
    order: &[usize],
    max_complexity: f64,
    num_samples: usize,
    x0: &[usize],
    min_num_vars: usize,
    rng: &mut R,
    return_marginals: bool,
) -> Result<SampleResult> {
    let task = Task::new(tables, LogSumProduct::new(), min_num_vars)?;
    let x0 = expand_x0(x0, task.dom_sizes())?;
    let decomp = build_decomp(&task, order, max_complexity)?;

    let solvable = num_samples > 0;
    let mut tree = BucketTree::new(&task, &decomp, &x0, solvable, return_marginals)?;

    let mut samples = Array2::zeros((num_samples, task.num_vars()));
    for i in 0..num_samples {
        let state = tree.solve(rng)?;
        samples
            .row_mut(i)
            .iter_mut()
            .zip(state.assignment())
            .for_each(|(cell, &value)| *cell = value);
    }

    let marginals = if return_marginals {
        Some(tree.marginals()?)
    } else {
        None
    };

    Ok(SampleResult {
        log_partition: *tree.problem_value(),
        samples,
        marginals,
    })
}

/// Compute the global minimum and the number of assignments attaining it.
///
/// # Arguments
///
/// * `tables` - The input factor tables.
/// * `order` - The elimination order; absent variables are clamped.
/// * `max_complexity` - The complexity bound on the decomposition.
/// * `eps` - The absolute tolerance used to detect cost ties.
/// * `x0` - The initial assignment: empty for all zeros, or one entry per
///   variable; only clamped entries are consulted.
/// * `min_num_vars` - A lower bound on the variable count.
///
/// # Errors
///
/// [`Error::InvalidArgument`] on a malformed order, assignment or tolerance,
/// [`Error::ExcessiveComplexity`] if the decomposition exceeds the bound.
///
/// # Returns
///
/// The minimum value paired with its attainment count.
///
pub fn count_minimum(
    tables: &[Table<f64>],
    order: &[usize],
    max_complexity: f64,
    eps: f64,
    x0: &[usize],
    min_num_vars: usize,
) -> Result<CountedValue> {
    // Lift the tables into the counting value domain.
    let tables: Vec<Table<CountedValue>> = tables
        .iter()
        .map(|table| table.map(|&value| CountedValue { value, count: 1 }))
        .collect();

    let task = Task::new(&tables, CountMin::new(eps)?, min_num_vars)?;
    let x0 = expand_x0(x0, task.dom_sizes())?;
    let decomp = build_decomp(&task, order, max_complexity)?;

    let tree = BucketTree::new(&task, &decomp, &x0, false, false)?;

    Ok(*tree.problem_value())
}

/// Expand and validate an initial assignment.
fn expand_x0(x0: &[usize], dom_sizes: &[usize]) -> Result<Vec<usize>> {
    if x0.is_empty() {
        return Ok(vec![0; dom_sizes.len()]);
    }
    if x0.len() != dom_sizes.len() {
        return Err(Error::InvalidArgument(format!(
            "initial assignment has length {}, expected {} or zero",
            x0.len(),
            dom_sizes.len()
        )));
    }

    Ok(x0.to_vec())
}

/// Build the decomposition and check it against the complexity bound.
fn build_decomp<S: Semiring>(
    task: &Task<'_, S>,
    order: &[usize],
    max_complexity: f64,
) -> Result<TreeDecomp> {
    let decomp = TreeDecomp::new(task.graph(), order, task.dom_sizes())?;
    if decomp.complexity() > max_complexity {
        return Err(Error::ExcessiveComplexity {
            complexity: decomp.complexity(),
            max_complexity,
        });
    }

    Ok(decomp)
}
