use rand::{Rng, RngCore};

use crate::{
    error::{Error, Result},
    utils::MI,
};

use super::{Marginalizer, Semiring, Solution, SolvableMarginalizer};

/// The log-sum-product semiring.
///
/// Values are log-space weights, combination is addition with identity zero
/// (a log-space product), and marginalization computes a numerically stable
/// log-sum-exp. The solvable variant draws an exact sample of the eliminated
/// variable conditioned on its separator.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSumProduct;

impl LogSumProduct {
    /// Construct a new log-sum-product semiring.
    ///
    /// # Returns
    ///
    /// A new `LogSumProduct` instance.
    ///
    pub const fn new() -> Self {
        Self
    }
}

impl Semiring for LogSumProduct {
    type Value = f64;
    type Solution = SampledState;

    #[inline]
    fn combine(&self, x: &f64, y: &f64) -> f64 {
        x + y
    }

    #[inline]
    fn combine_identity(&self) -> f64 {
        0.
    }

    fn marginalizer(&self) -> Result<Box<dyn Marginalizer<f64>>> {
        Ok(Box::new(LogSumExpMarginalizer))
    }

    fn solvable_marginalizer(
        &self,
        sep_vars: &[usize],
        sep_dom_sizes: &[usize],
        out_var: usize,
        out_dom_size: usize,
    ) -> Result<Box<dyn SolvableMarginalizer<f64, SampledState>>> {
        // Size the cumulative masses from the separator shape.
        let sep = MI::new(sep_dom_sizes.iter().copied())?;
        let masses = sep
            .size()
            .checked_mul(out_dom_size)
            .ok_or(Error::LengthOverflow)?;

        Ok(Box::new(SamplingMarginalizer {
            out_var,
            out_dom_size,
            sep_vars: sep_vars.to_vec(),
            sep,
            masses: Vec::with_capacity(masses),
        }))
    }

    fn init_solution(&self, dom_sizes: &[usize]) -> Result<SampledState> {
        Ok(SampledState {
            assignment: vec![0; dom_sizes.len()],
            log_partition: 0.,
        })
    }
}

/// Compute `m + log Σ exp(x - m)` with `m = max x`.
///
/// # Arguments
///
/// * `cells` - The log-space values to reduce.
///
/// # Returns
///
/// The log-sum-exp, negative infinity when every cell is.
///
pub fn log_sum_exp(cells: &[f64]) -> f64 {
    let max = cells.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }

    max + cells.iter().map(|&x| (x - max).exp()).sum::<f64>().ln()
}

/// The non-solvable log-sum-exp reducer.
struct LogSumExpMarginalizer;

impl Marginalizer<f64> for LogSumExpMarginalizer {
    fn marginalize(&mut self, _out_index: usize, cells: &[f64]) -> f64 {
        log_sum_exp(cells)
    }
}

/// The solvable log-sum-exp reducer.
///
/// Per separator assignment it records the cumulative normalized masses of
/// the eliminated variable, read back when sampling.
struct SamplingMarginalizer {
    out_var: usize,
    out_dom_size: usize,
    sep_vars: Vec<usize>,
    sep: MI,
    masses: Vec<f64>,
}

impl SamplingMarginalizer {
    /// Ravel the separator assignment of a sampled state.
    fn sep_index(&self, assignment: &[usize]) -> usize {
        self.sep.ravel(self.sep_vars.iter().map(|&x| assignment[x]))
    }
}

impl Marginalizer<f64> for SamplingMarginalizer {
    fn marginalize(&mut self, _out_index: usize, cells: &[f64]) -> f64 {
        let max = cells.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            // A zero-mass separator assignment is never sampled.
            self.masses.extend(cells.iter().map(|_| 1.));
            return f64::NEG_INFINITY;
        }

        let total: f64 = cells.iter().map(|&x| (x - max).exp()).sum();
        let mut cumulative = 0.;
        self.masses.extend(cells.iter().map(|&x| {
            cumulative += (x - max).exp() / total;
            cumulative
        }));
        // Pin the tail against rounding.
        if let Some(last) = self.masses.last_mut() {
            *last = 1.;
        }

        max + total.ln()
    }
}

impl SolvableMarginalizer<f64, SampledState> for SamplingMarginalizer {
    fn solve(&self, solution: &mut SampledState, rng: &mut dyn RngCore) -> Result<()> {
        let base = self.sep_index(&solution.assignment) * self.out_dom_size;
        let masses = &self.masses[base..base + self.out_dom_size];

        // Pick the first choice whose cumulative mass exceeds the draw.
        let u = rng.random::<f64>();
        let choice = masses
            .iter()
            .position(|&mass| mass > u)
            .unwrap_or(self.out_dom_size - 1);
        solution.assignment[self.out_var] = choice;

        Ok(())
    }
}

/// A single assignment drawn from the Gibbs distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledState {
    assignment: Vec<usize>,
    log_partition: f64,
}

impl SampledState {
    /// Return the sampled assignment, one domain index per variable.
    ///
    /// # Returns
    ///
    /// A reference to the assignment.
    ///
    #[inline]
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Return the log partition function of the sampled distribution.
    ///
    /// # Returns
    ///
    /// The log partition function.
    ///
    #[inline]
    pub const fn log_partition(&self) -> f64 {
        self.log_partition
    }
}

impl Solution<f64> for SampledState {
    fn assign(&mut self, x: usize, value: usize) {
        self.assignment[x] = value;
    }

    fn seed(&mut self, value: &f64) {
        self.log_partition += value;
    }
}
