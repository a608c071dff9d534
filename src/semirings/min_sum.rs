use std::cmp::Ordering;

use rand::RngCore;

use crate::{error::Result, utils::MI};

use super::{Marginalizer, Semiring, Solution, SolvableMarginalizer};

/// The minimization semiring.
///
/// Values are costs, combination is addition with identity zero, and
/// marginalization takes the minimum over the eliminated variable. The
/// solvable variant reconstructs up to `max_solutions` distinct lowest-cost
/// assignments, ties broken lexicographically.
#[derive(Clone, Debug)]
pub struct MinSum {
    max_solutions: usize,
}

impl MinSum {
    /// Construct a new minimization semiring recovering a single solution.
    ///
    /// # Returns
    ///
    /// A new `MinSum` instance.
    ///
    pub const fn new() -> Self {
        Self { max_solutions: 1 }
    }

    /// Set the number of lowest-cost assignments to recover.
    ///
    /// # Arguments
    ///
    /// * `k` - The number of solutions.
    ///
    pub fn set_max_solutions(&mut self, k: usize) {
        self.max_solutions = k;
    }

    /// Return the number of lowest-cost assignments to recover.
    ///
    /// # Returns
    ///
    /// The configured number of solutions.
    ///
    #[inline]
    pub const fn max_solutions(&self) -> usize {
        self.max_solutions
    }
}

impl Default for MinSum {
    fn default() -> Self {
        Self::new()
    }
}

impl Semiring for MinSum {
    type Value = f64;
    type Solution = SolutionSet;

    #[inline]
    fn combine(&self, x: &f64, y: &f64) -> f64 {
        x + y
    }

    #[inline]
    fn combine_identity(&self) -> f64 {
        0.
    }

    fn marginalizer(&self) -> Result<Box<dyn Marginalizer<f64>>> {
        Ok(Box::new(MinMarginalizer))
    }

    fn solvable_marginalizer(
        &self,
        sep_vars: &[usize],
        sep_dom_sizes: &[usize],
        out_var: usize,
        _out_dom_size: usize,
    ) -> Result<Box<dyn SolvableMarginalizer<f64, SolutionSet>>> {
        // Size the per-output records from the separator shape.
        let sep = MI::new(sep_dom_sizes.iter().copied())?;

        Ok(Box::new(KBestMarginalizer {
            k: self.max_solutions.max(1),
            out_var,
            sep_vars: sep_vars.to_vec(),
            records: vec![Vec::new(); sep.size()],
            sep,
        }))
    }

    fn init_solution(&self, dom_sizes: &[usize]) -> Result<SolutionSet> {
        Ok(SolutionSet {
            k: self.max_solutions.max(1),
            items: vec![SolutionItem {
                value: 0.,
                assignment: vec![0; dom_sizes.len()],
            }],
        })
    }
}

/// The non-solvable minimum reducer.
struct MinMarginalizer;

impl Marginalizer<f64> for MinMarginalizer {
    fn marginalize(&mut self, _out_index: usize, cells: &[f64]) -> f64 {
        cells.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// The solvable minimum reducer.
///
/// Per separator assignment it records the up-to-`k` best `(value, choice)`
/// pairs of the eliminated variable, sorted by value then choice.
struct KBestMarginalizer {
    k: usize,
    out_var: usize,
    sep_vars: Vec<usize>,
    sep: MI,
    records: Vec<Vec<(f64, usize)>>,
}

impl KBestMarginalizer {
    /// Ravel the separator assignment of a partial solution.
    fn sep_index(&self, assignment: &[usize]) -> usize {
        self.sep.ravel(self.sep_vars.iter().map(|&x| assignment[x]))
    }
}

impl Marginalizer<f64> for KBestMarginalizer {
    fn marginalize(&mut self, out_index: usize, cells: &[f64]) -> f64 {
        // Rank the choices by value, then by domain index.
        let mut records: Vec<_> = cells.iter().copied().enumerate().map(|(d, v)| (v, d)).collect();
        records.sort_by(|x, y| x.0.total_cmp(&y.0).then_with(|| x.1.cmp(&y.1)));
        records.truncate(self.k);
        // The head is the minimum sent upward.
        let min = records[0].0;
        self.records[out_index] = records;

        min
    }
}

impl SolvableMarginalizer<f64, SolutionSet> for KBestMarginalizer {
    fn solve(&self, solution: &mut SolutionSet, _rng: &mut dyn RngCore) -> Result<()> {
        let mut items = Vec::with_capacity(solution.k);

        // Extend every partial solution with every recorded choice.
        for item in &solution.items {
            let records = &self.records[self.sep_index(&item.assignment)];
            // The head is the cost already accounted for in the item value.
            let lambda = records[0].0;
            for &(value, choice) in records {
                let mut assignment = item.assignment.clone();
                assignment[self.out_var] = choice;
                let item = SolutionItem {
                    value: item.value + (value - lambda),
                    assignment,
                };
                insert_bounded(&mut items, solution.k, item);
            }
        }

        solution.items = items;

        Ok(())
    }
}

/// A complete or partial assignment with its accumulated cost.
#[derive(Clone, Debug, PartialEq)]
pub struct SolutionItem {
    value: f64,
    assignment: Vec<usize>,
}

impl SolutionItem {
    /// Return the cost of the assignment.
    ///
    /// # Returns
    ///
    /// The accumulated cost.
    ///
    #[inline]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Return the assignment, one domain index per variable.
    ///
    /// # Returns
    ///
    /// A reference to the assignment.
    ///
    #[inline]
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }
}

/// The set of up-to-`k` lowest-cost assignments.
///
/// Items are kept sorted by cost, ties broken by lexicographic comparison of
/// the assignments, and are pairwise distinct.
#[derive(Clone, Debug, PartialEq)]
pub struct SolutionSet {
    k: usize,
    items: Vec<SolutionItem>,
}

impl SolutionSet {
    /// Return the recovered assignments in ascending cost order.
    ///
    /// # Returns
    ///
    /// A reference to the items.
    ///
    #[inline]
    pub fn items(&self) -> &[SolutionItem] {
        &self.items
    }
}

impl Solution<f64> for SolutionSet {
    fn assign(&mut self, x: usize, value: usize) {
        self.items
            .iter_mut()
            .for_each(|item| item.assignment[x] = value);
    }

    fn seed(&mut self, value: &f64) {
        self.items.iter_mut().for_each(|item| item.value += value);
    }
}

/// Compare items by cost, then lexicographically by assignment.
fn compare(x: &SolutionItem, y: &SolutionItem) -> Ordering {
    x.value
        .total_cmp(&y.value)
        .then_with(|| x.assignment.cmp(&y.assignment))
}

/// Insert an item into a bounded sorted set, dropping the overflow.
fn insert_bounded(items: &mut Vec<SolutionItem>, k: usize, item: SolutionItem) {
    let position = items.partition_point(|x| compare(x, &item) != Ordering::Greater);
    if position >= k {
        return;
    }
    items.insert(position, item);
    items.truncate(k);
}
