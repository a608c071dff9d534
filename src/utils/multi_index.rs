use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A structure to compute the ravel index of a multi-dimensional array.
///
/// The first dimension is the least significant one, i.e. `strides[i]` is the
/// product of the shapes of the dimensions preceding `i`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MultiIndex {
    shape: Array1<usize>,
    strides: Array1<usize>,
    size: usize,
}

/// A type alias for the multi index.
pub type MI = MultiIndex;

impl MI {
    /// Construct a new `MultiIndex` from the shape of each dimension.
    ///
    /// # Arguments
    ///
    /// * `shape` - An iterator over the shape of each dimension.
    ///
    /// # Errors
    ///
    /// [`Error::LengthOverflow`] if the product of the shapes overflows.
    ///
    /// # Returns
    ///
    /// A new `MultiIndex` instance.
    ///
    pub fn new<I>(shape: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        // Collect the multi index.
        let shape: Array1<_> = shape.into_iter().collect();
        // Allocate the strides of the dimensions.
        let mut strides = Array1::from_elem(shape.len(), 1);
        // Compute the checked cumulative product, first dimension fastest.
        let mut size = 1_usize;
        for i in 0..shape.len() {
            strides[i] = size;
            size = size.checked_mul(shape[i]).ok_or(Error::LengthOverflow)?;
        }

        Ok(Self {
            shape,
            strides,
            size,
        })
    }

    /// Return the shape of each dimension.
    ///
    /// # Returns
    ///
    /// A reference to the shape.
    ///
    #[inline]
    pub const fn shape(&self) -> &Array1<usize> {
        &self.shape
    }

    /// Return the stride of each dimension.
    ///
    /// # Returns
    ///
    /// A reference to the strides.
    ///
    #[inline]
    pub const fn strides(&self) -> &Array1<usize> {
        &self.strides
    }

    /// Return the total number of addressable cells.
    ///
    /// # Returns
    ///
    /// The product of the shapes, one for the empty shape.
    ///
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Compute the ravel index from a multi-dimensional index.
    ///
    /// # Arguments
    ///
    /// * `multi_index` - An iterator over the multi-dimensional index.
    ///
    /// # Returns
    ///
    /// The ravelled index.
    ///
    pub fn ravel<I>(&self, multi_index: I) -> usize
    where
        I: IntoIterator<Item = usize>,
    {
        self.strides
            .iter()
            .zip(multi_index)
            .map(|(i, j)| i * j)
            .sum()
    }

    /// Compute the multi-dimensional index from a ravelled index.
    ///
    /// # Arguments
    ///
    /// * `index` - The ravelled index.
    ///
    /// # Returns
    ///
    /// A vector containing the multi-dimensional index.
    ///
    pub fn unravel(&self, index: usize) -> Vec<usize> {
        let mut multi_index = Vec::with_capacity(self.shape.len());
        let mut remaining_index = index;

        for &shape in &self.shape {
            multi_index.push(remaining_index % shape);
            remaining_index /= shape;
        }

        multi_index
    }
}
