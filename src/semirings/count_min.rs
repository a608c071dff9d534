use approx::abs_diff_eq;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Marginalizer, NoSolution, Semiring, SolvableMarginalizer};

/// A cost together with the number of assignments attaining it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountedValue {
    /// The cost.
    pub value: f64,
    /// The number of assignments attaining the cost, saturating on overflow.
    pub count: u64,
}

/// The counting minimization semiring.
///
/// Combination adds costs and multiplies counts, marginalization keeps the
/// minimum cost and sums the counts of every choice within an absolute
/// tolerance of it.
#[derive(Clone, Copy, Debug)]
pub struct CountMin {
    eps: f64,
}

impl CountMin {
    /// Construct a new counting minimization semiring.
    ///
    /// # Arguments
    ///
    /// * `eps` - The absolute tolerance used to detect cost ties.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the tolerance is negative or non-finite.
    ///
    /// # Returns
    ///
    /// A new `CountMin` instance.
    ///
    pub fn new(eps: f64) -> Result<Self> {
        if !eps.is_finite() || eps < 0. {
            return Err(Error::InvalidArgument(format!(
                "tolerance must be non-negative and finite, got {eps}"
            )));
        }

        Ok(Self { eps })
    }

    /// Return the absolute tie tolerance.
    ///
    /// # Returns
    ///
    /// The tolerance.
    ///
    #[inline]
    pub const fn eps(&self) -> f64 {
        self.eps
    }
}

impl Semiring for CountMin {
    type Value = CountedValue;
    type Solution = NoSolution;

    #[inline]
    fn combine(&self, x: &CountedValue, y: &CountedValue) -> CountedValue {
        CountedValue {
            value: x.value + y.value,
            count: x.count.saturating_mul(y.count),
        }
    }

    #[inline]
    fn combine_identity(&self) -> CountedValue {
        CountedValue {
            value: 0.,
            count: 1,
        }
    }

    fn marginalizer(&self) -> Result<Box<dyn Marginalizer<CountedValue>>> {
        Ok(Box::new(CountMinMarginalizer { eps: self.eps }))
    }

    fn solvable_marginalizer(
        &self,
        _sep_vars: &[usize],
        _sep_dom_sizes: &[usize],
        _out_var: usize,
        _out_dom_size: usize,
    ) -> Result<Box<dyn SolvableMarginalizer<CountedValue, NoSolution>>> {
        Err(Error::OperationUnavailable(
            "the counting minimization semiring cannot reconstruct assignments",
        ))
    }

    fn init_solution(&self, _dom_sizes: &[usize]) -> Result<NoSolution> {
        Err(Error::OperationUnavailable(
            "the counting minimization semiring has no solution object",
        ))
    }
}

/// The counting minimum reducer.
struct CountMinMarginalizer {
    eps: f64,
}

impl Marginalizer<CountedValue> for CountMinMarginalizer {
    fn marginalize(&mut self, _out_index: usize, cells: &[CountedValue]) -> CountedValue {
        let value = cells
            .iter()
            .map(|cell| cell.value)
            .fold(f64::INFINITY, f64::min);
        let count = cells
            .iter()
            .filter(|cell| abs_diff_eq!(cell.value, value, epsilon = self.eps))
            .fold(0_u64, |count, cell| count.saturating_add(cell.count));

        CountedValue { value, count }
    }
}
