use std::{cmp::Reverse, collections::BTreeSet};

use itertools::Itertools;
use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    inference::Task,
    semirings::{Dummy, Semiring},
    tables::Table,
    types::FxIndexSet,
};

/// The cost heuristics driving the greedy elimination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heuristic {
    /// The number of neighbors.
    MinDegree,
    /// The domain size times the number of neighbors.
    WeightedMinDegree,
    /// The number of fill edges the elimination clique would add.
    MinFill,
    /// The summed domain-size products over the fill edges.
    WeightedMinFill,
}

/// Compute an elimination order honoring a complexity bound.
///
/// Variables are eliminated greedily by the heuristic cost; whenever no
/// remaining variable can be eliminated within the bound, one is clamped
/// instead and disappears from the returned order.
///
/// # Arguments
///
/// * `tables` - The input factor tables; only their scopes are consulted.
/// * `max_complexity` - The bound on the per-step elimination complexity.
/// * `clamp_ranks` - Empty for all zeros, or one entry per variable;
///   lower-rank variables clamp first, a negative rank clamps immediately.
/// * `heuristic` - The cost heuristic.
/// * `selection_scale` - Enlarges the candidate pool at every step; zero
///   keeps only the cost ties.
/// * `rng` - The uniform source breaking ties; identical seeds reproduce
///   the order.
///
/// # Errors
///
/// [`Error::InvalidArgument`] on a non-finite bound or scale, a negative
/// scale, or a clamp-rank length mismatch.
///
/// # Returns
///
/// The elimination order; variables left out are meant to be clamped.
///
pub fn greedy_var_order<R: Rng>(
    tables: &[Table<f64>],
    max_complexity: f64,
    clamp_ranks: &[i64],
    heuristic: Heuristic,
    selection_scale: f64,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if !max_complexity.is_finite() {
        return Err(Error::InvalidArgument(format!(
            "complexity bound must be finite, got {max_complexity}"
        )));
    }
    if !selection_scale.is_finite() || selection_scale < 0. {
        return Err(Error::InvalidArgument(format!(
            "selection scale must be non-negative and finite, got {selection_scale}"
        )));
    }

    let task = Task::new(tables, Dummy::new(), 0)?;

    let clamp_ranks = if clamp_ranks.is_empty() {
        vec![0; task.num_vars()]
    } else if clamp_ranks.len() != task.num_vars() {
        return Err(Error::InvalidArgument(format!(
            "clamp ranks have length {}, expected {} or zero",
            clamp_ranks.len(),
            task.num_vars()
        )));
    } else {
        clamp_ranks.to_vec()
    };

    GreedyOrder::new(&task, max_complexity, clamp_ranks, heuristic, selection_scale).run(rng)
}

/// The per-variable state of the greedy ordering.
#[derive(Clone, Debug)]
struct VarState {
    cost: u64,
    clamp_rank: i64,
    clamp_value: u64,
    processed: bool,
}

/// The greedy ordering machinery.
///
/// Active variables are indexed three ways: by identifier through a dense
/// array, by `(cost, identifier)` and by `(clamp rank, clamp value,
/// identifier)` through two ordered sets. Set entries are removed and
/// reinserted whenever an update changes their key.
#[derive(Clone, Debug)]
pub struct GreedyOrder {
    dom_sizes: Vec<usize>,
    adjacency: Vec<FxIndexSet<usize>>,
    heuristic: Heuristic,
    max_complexity: f64,
    selection_scale: f64,
    states: Vec<VarState>,
    by_cost: BTreeSet<(u64, usize)>,
    by_clamp: BTreeSet<(i64, Reverse<u64>, usize)>,
    order: Vec<usize>,
}

impl GreedyOrder {
    /// Construct the ordering machinery over a task's factor graph.
    ///
    /// # Arguments
    ///
    /// * `task` - The bound task, typically over the inert semiring.
    /// * `max_complexity` - The bound on the elimination complexity.
    /// * `clamp_ranks` - One rank per variable.
    /// * `heuristic` - The cost heuristic.
    /// * `selection_scale` - The candidate pool enlargement.
    ///
    /// # Returns
    ///
    /// A new `GreedyOrder` instance.
    ///
    pub fn new<S: Semiring>(
        task: &Task<'_, S>,
        max_complexity: f64,
        clamp_ranks: Vec<i64>,
        heuristic: Heuristic,
        selection_scale: f64,
    ) -> Self {
        let num_vars = task.num_vars();
        let graph = task.graph();
        let adjacency: Vec<FxIndexSet<usize>> = (0..num_vars)
            .map(|x| graph.neighbors(x).iter().copied().collect())
            .collect();

        let mut this = Self {
            dom_sizes: task.dom_sizes().to_vec(),
            adjacency,
            heuristic,
            max_complexity,
            selection_scale,
            states: Vec::with_capacity(num_vars),
            by_cost: BTreeSet::new(),
            by_clamp: BTreeSet::new(),
            order: Vec::new(),
        };

        for x in 0..num_vars {
            let state = VarState {
                cost: this.cost(x),
                clamp_rank: clamp_ranks[x],
                clamp_value: this.clamp_value(x),
                processed: false,
            };
            this.by_cost.insert((state.cost, x));
            this.by_clamp
                .insert((state.clamp_rank, Reverse(state.clamp_value), x));
            this.states.push(state);
        }

        this
    }

    /// Run the ordering to completion.
    ///
    /// # Arguments
    ///
    /// * `rng` - The uniform source breaking ties.
    ///
    /// # Returns
    ///
    /// The elimination order.
    ///
    pub fn run<R: Rng>(mut self, rng: &mut R) -> Result<Vec<usize>> {
        // Negative ranks clamp before anything is eliminated.
        let forced = (0..self.states.len())
            .filter(|&x| self.states[x].clamp_rank < 0)
            .collect_vec();
        for x in forced {
            debug!("Clamped variable {x} on input rank");
            self.clamp(x, false);
        }

        while !self.by_cost.is_empty() {
            match self.select_elimination(rng) {
                Some(x) => {
                    debug!("Eliminated variable {x} with cost {}", self.states[x].cost);
                    self.eliminate(x);
                }
                None => {
                    let x = self.select_clamp(rng);
                    debug!("Clamped variable {x} over the complexity bound");
                    self.clamp(x, true);
                }
            }
        }

        Ok(self.order)
    }

    /// Compute the heuristic cost of a variable.
    fn cost(&self, x: usize) -> u64 {
        match self.heuristic {
            Heuristic::MinDegree => self.adjacency[x].len() as u64,
            Heuristic::WeightedMinDegree => self.clamp_value(x),
            Heuristic::MinFill => self.fill_pairs(x).count() as u64,
            Heuristic::WeightedMinFill => self
                .fill_pairs(x)
                .map(|(y, z)| self.dom_sizes[y] as u64 * self.dom_sizes[z] as u64)
                .sum(),
        }
    }

    /// Iterate the non-adjacent neighbor pairs of a variable.
    fn fill_pairs(&self, x: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency[x]
            .iter()
            .copied()
            .tuple_combinations()
            .filter(|&(y, z)| !self.adjacency[y].contains(&z))
    }

    /// Compute the clamp value of a variable.
    fn clamp_value(&self, x: usize) -> u64 {
        self.dom_sizes[x] as u64 * self.adjacency[x].len() as u64
    }

    /// Compute the elimination complexity of a variable.
    fn complexity(&self, x: usize) -> f64 {
        (self.dom_sizes[x] as f64).log2()
            + self.adjacency[x]
                .iter()
                .map(|&y| (self.dom_sizes[y] as f64).log2())
                .sum::<f64>()
    }

    /// Enlarge a candidate pool to the configured scale.
    fn pool_target(&self, ties: usize) -> usize {
        usize::max(ties, (self.selection_scale * ties as f64).ceil() as usize)
    }

    /// Select the next variable to eliminate, if any is feasible.
    fn select_elimination<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let mut pool = Vec::new();
        let mut min_cost = None;
        let mut target = None;

        for &(cost, x) in &self.by_cost {
            let complexity = self.complexity(x);
            trace!("Candidate {x}: cost {cost}, elimination complexity {complexity:.3}");
            if complexity > self.max_complexity {
                continue;
            }
            match min_cost {
                // The first feasible variable fixes the minimum cost.
                None => min_cost = Some(cost),
                // Past the ties, fix the enlarged pool size once.
                Some(min_cost) if cost > min_cost => {
                    let target = *target.get_or_insert_with(|| self.pool_target(pool.len()));
                    if pool.len() >= target {
                        break;
                    }
                }
                Some(_) => {}
            }
            pool.push(x);
        }

        if pool.is_empty() {
            return None;
        }

        Some(pool[rng.random_range(0..pool.len())])
    }

    /// Select the next variable to clamp.
    fn select_clamp<R: Rng>(&self, rng: &mut R) -> usize {
        let mut pool = Vec::new();
        let mut head = None;
        let mut target = None;

        for &(rank, Reverse(value), x) in &self.by_clamp {
            trace!("Clamp candidate {x}: rank {rank}, value {value}");
            match head {
                None => head = Some((rank, value)),
                Some(head) if (rank, value) != head => {
                    let target = *target.get_or_insert_with(|| self.pool_target(pool.len()));
                    if pool.len() >= target {
                        break;
                    }
                }
                Some(_) => {}
            }
            pool.push(x);
        }

        pool[rng.random_range(0..pool.len())]
    }

    /// Eliminate a variable: form its clique and update the neighborhood.
    fn eliminate(&mut self, x: usize) {
        self.order.push(x);
        self.retire(x);

        let adjacent = self.adjacency[x].iter().copied().collect_vec();
        // Connect the elimination clique.
        for (i, &y) in adjacent.iter().enumerate() {
            for &z in &adjacent[i + 1..] {
                self.adjacency[y].insert(z);
                self.adjacency[z].insert(y);
            }
        }
        // Remove the eliminated variable.
        for &y in &adjacent {
            self.adjacency[y].swap_remove(&x);
        }
        self.adjacency[x].clear();

        self.refresh(&adjacent);
    }

    /// Clamp a variable: remove it and update the neighborhood.
    fn clamp(&mut self, x: usize, decrement: bool) {
        self.retire(x);

        let adjacent = self.adjacency[x].iter().copied().collect_vec();
        for &y in &adjacent {
            self.adjacency[y].swap_remove(&x);
        }
        self.adjacency[x].clear();

        self.refresh(&adjacent);

        if decrement {
            // Later clamps move one rank closer.
            let rank = self.states[x].clamp_rank;
            let behind = self
                .by_clamp
                .iter()
                .filter(|&&(r, _, _)| r > rank)
                .copied()
                .collect_vec();
            for (r, value, y) in behind {
                self.by_clamp.remove(&(r, value, y));
                self.states[y].clamp_rank = r - 1;
                self.by_clamp.insert((r - 1, value, y));
            }
        }
    }

    /// Remove a variable from every active view.
    fn retire(&mut self, x: usize) {
        let state = &mut self.states[x];
        state.processed = true;
        self.by_cost.remove(&(state.cost, x));
        self.by_clamp
            .remove(&(state.clamp_rank, Reverse(state.clamp_value), x));
    }

    /// Recompute the keys of every variable affected by a graph update.
    fn refresh(&mut self, adjacent: &[usize]) {
        let mut affected: FxIndexSet<usize> = adjacent.iter().copied().collect();
        // Fill costs also depend on the neighbors of the neighbors.
        if matches!(
            self.heuristic,
            Heuristic::MinFill | Heuristic::WeightedMinFill
        ) {
            for &y in adjacent {
                affected.extend(self.adjacency[y].iter().copied());
            }
        }

        for y in affected {
            if self.states[y].processed {
                continue;
            }
            let (cost, clamp_value) = (self.cost(y), self.clamp_value(y));
            let state = &self.states[y];
            self.by_cost.remove(&(state.cost, y));
            self.by_cost.insert((cost, y));
            self.by_clamp
                .remove(&(state.clamp_rank, Reverse(state.clamp_value), y));
            self.by_clamp
                .insert((state.clamp_rank, Reverse(clamp_value), y));
            let state = &mut self.states[y];
            state.cost = cost;
            state.clamp_value = clamp_value;
        }
    }
}
