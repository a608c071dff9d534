use std::ops::Index;

use itertools::Itertools;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    utils::MI,
};

/// A factor table over an ordered scope of finite-domain variables.
///
/// The scope is strictly increasing and immutable; cell values are stored
/// flat with the first scope variable as the least significant dimension,
/// i.e. the step size of `vars()[i]` is the product of the domain sizes of
/// the variables preceding it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table<Y> {
    vars: Vec<usize>,
    index: MI,
    values: Array1<Y>,
}

impl<Y> Table<Y> {
    /// Construct a new table given its scope and values.
    ///
    /// # Arguments
    ///
    /// * `scope` - An iterator over `(variable, domain size)` pairs, with
    ///   strictly increasing variables.
    /// * `values` - The cell values, one per assignment of the scope.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the scope is not strictly increasing,
    /// a domain is empty, or the values length does not match the scope;
    /// [`Error::LengthOverflow`] if the product of the domain sizes
    /// overflows.
    ///
    /// # Returns
    ///
    /// A new `Table` instance.
    ///
    pub fn new<I>(scope: I, values: Array1<Y>) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let (vars, dom_sizes): (Vec<_>, Vec<_>) = scope.into_iter().unzip();

        // Assert the scope is strictly increasing with non-empty domains.
        if !vars.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::InvalidArgument(format!(
                "table scope must be strictly increasing, got {vars:?}"
            )));
        }
        if dom_sizes.iter().any(|&d| d == 0) {
            return Err(Error::InvalidArgument(format!(
                "table domain sizes must be positive, got {dom_sizes:?}"
            )));
        }

        let index = MI::new(dom_sizes)?;
        if values.len() != index.size() {
            return Err(Error::InvalidArgument(format!(
                "table values length must match the scope size: \
                 expected {}, got {}",
                index.size(),
                values.len()
            )));
        }

        Ok(Self {
            vars,
            index,
            values,
        })
    }

    /// Construct a table holding a single value over the empty scope.
    ///
    /// # Arguments
    ///
    /// * `value` - The scalar value.
    ///
    /// # Returns
    ///
    /// A new `Table` instance of size one.
    ///
    pub fn scalar(value: Y) -> Self {
        Self {
            vars: Vec::new(),
            index: MI::new([]).expect("Empty shape cannot overflow"),
            values: Array1::from_vec(vec![value]),
        }
    }

    /// Return the scope of the table.
    ///
    /// # Returns
    ///
    /// The variables in strictly increasing order.
    ///
    #[inline]
    pub fn vars(&self) -> &[usize] {
        &self.vars
    }

    /// Return the domain sizes, aligned with the scope.
    ///
    /// # Returns
    ///
    /// A reference to the domain sizes.
    ///
    #[inline]
    pub const fn dom_sizes(&self) -> &Array1<usize> {
        self.index.shape()
    }

    /// Return the step sizes, aligned with the scope.
    ///
    /// # Returns
    ///
    /// A reference to the step sizes.
    ///
    #[inline]
    pub const fn step_sizes(&self) -> &Array1<usize> {
        self.index.strides()
    }

    /// Return the number of cells.
    ///
    /// # Returns
    ///
    /// The product of the domain sizes, one for the empty scope.
    ///
    #[inline]
    pub const fn size(&self) -> usize {
        self.index.size()
    }

    /// Return the position of a variable within the scope.
    ///
    /// # Arguments
    ///
    /// * `x` - The variable.
    ///
    /// # Returns
    ///
    /// The position, or `None` if the variable is not in scope.
    ///
    #[inline]
    pub fn position(&self, x: usize) -> Option<usize> {
        self.vars.binary_search(&x).ok()
    }

    /// Check whether a variable is in the scope.
    ///
    /// # Arguments
    ///
    /// * `x` - The variable.
    ///
    /// # Returns
    ///
    /// `true` if the variable is in scope, `false` otherwise.
    ///
    #[inline]
    pub fn in_scope(&self, x: usize) -> bool {
        self.position(x).is_some()
    }

    /// Return the domain size of a variable in the scope.
    ///
    /// # Arguments
    ///
    /// * `x` - The variable.
    ///
    /// # Panics
    ///
    /// * If the variable is not in scope.
    ///
    /// # Returns
    ///
    /// The domain size.
    ///
    pub fn dom_size(&self, x: usize) -> usize {
        let position = self.position(x).expect("Variable must be in scope");

        self.index.shape()[position]
    }

    /// Return the step size of a variable.
    ///
    /// # Arguments
    ///
    /// * `x` - The variable.
    ///
    /// # Returns
    ///
    /// The step size, zero if the variable is not in scope.
    ///
    pub fn step_size(&self, x: usize) -> usize {
        self.position(x)
            .map_or(0, |position| self.index.strides()[position])
    }

    /// Return the cell values in flat order.
    ///
    /// # Returns
    ///
    /// A reference to the values.
    ///
    #[inline]
    pub const fn values(&self) -> &Array1<Y> {
        &self.values
    }

    /// Evaluate the table under a full assignment.
    ///
    /// # Arguments
    ///
    /// * `assignment` - One domain index per variable, indexed by variable;
    ///   entries of variables outside the scope are ignored.
    ///
    /// # Panics
    ///
    /// * If the assignment is shorter than the largest scope variable.
    ///
    /// # Returns
    ///
    /// A reference to the addressed cell.
    ///
    pub fn eval(&self, assignment: &[usize]) -> &Y {
        let flat = self.index.ravel(self.vars.iter().map(|&x| assignment[x]));

        &self.values[flat]
    }

    /// Build a table of a different value type by elementwise conversion.
    ///
    /// # Arguments
    ///
    /// * `f` - The cell conversion.
    ///
    /// # Returns
    ///
    /// A new `Table` instance over the same scope.
    ///
    pub fn map<Y2, F>(&self, f: F) -> Table<Y2>
    where
        F: FnMut(&Y) -> Y2,
    {
        Table {
            vars: self.vars.clone(),
            index: self.index.clone(),
            values: self.values.map(f),
        }
    }
}

impl<Y: Clone> Table<Y> {
    /// Construct a table filled with a single value.
    ///
    /// # Arguments
    ///
    /// * `scope` - An iterator over `(variable, domain size)` pairs.
    /// * `value` - The fill value.
    ///
    /// # Errors
    ///
    /// Same as [`Table::new`].
    ///
    /// # Returns
    ///
    /// A new `Table` instance.
    ///
    pub fn from_elem<I>(scope: I, value: Y) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let scope = scope.into_iter().collect_vec();
        let index = MI::new(scope.iter().map(|&(_, d)| d))?;
        let values = Array1::from_elem(index.size(), value);

        Self::new(scope, values)
    }

    /// Condition the table on the given evidence.
    ///
    /// The conditioned variables are dropped from the scope; evidence
    /// entries for variables outside the scope are ignored.
    ///
    /// # Arguments
    ///
    /// * `evidence` - An iterator over `(variable, domain index)` pairs.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if an evidence value is out of its domain.
    ///
    /// # Returns
    ///
    /// A new `Table` instance over the reduced scope.
    ///
    pub fn condition<I>(&self, evidence: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        // Keep the in-scope evidence, raveled into a base offset.
        let mut conditioned = vec![false; self.vars.len()];
        let mut base = 0;
        for (x, value) in evidence {
            let position = match self.position(x) {
                Some(position) => position,
                None => continue,
            };
            if value >= self.index.shape()[position] {
                return Err(Error::InvalidArgument(format!(
                    "evidence {value} is out of the domain of variable {x}"
                )));
            }
            conditioned[position] = true;
            base += value * self.index.strides()[position];
        }

        // Collect the surviving dimensions.
        let kept = (0..self.vars.len())
            .filter(|&position| !conditioned[position])
            .collect_vec();
        let scope = kept
            .iter()
            .map(|&position| (self.vars[position], self.index.shape()[position]))
            .collect_vec();
        let steps = kept
            .iter()
            .map(|&position| self.index.strides()[position])
            .collect_vec();

        // Gather the addressed cells.
        let index = MI::new(scope.iter().map(|&(_, d)| d))?;
        let values = (0..index.size())
            .map(|i| {
                let flat = index
                    .unravel(i)
                    .into_iter()
                    .zip(&steps)
                    .map(|(digit, step)| digit * step)
                    .sum::<usize>();
                self.values[base + flat].clone()
            })
            .collect();

        Self::new(scope, values)
    }
}

impl<Y> Index<usize> for Table<Y> {
    type Output = Y;

    #[inline]
    fn index(&self, index: usize) -> &Y {
        &self.values[index]
    }
}
