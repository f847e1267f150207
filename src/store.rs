//! Category store: append-only arena of learned categories.
//!
//! Categories are addressed by their position, which never changes: the
//! store only grows, so an index handed out by `learn` stays valid for the
//! lifetime of the engine.

use crate::error::{ArtError, Result};
use crate::kernel::Pattern;

/// One learned category.
#[derive(Clone, Debug, PartialEq)]
pub struct Category<P> {
    prototype: P,
    update_count: u64,
}

impl<P> Category<P> {
    pub fn prototype(&self) -> &P {
        &self.prototype
    }

    /// Number of times this category has resonated and learned.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

/// Arena of categories sharing one input dimension.
#[derive(Clone, Debug)]
pub struct CategoryStore<P> {
    categories: Vec<Category<P>>,
    expected_dimension: Option<usize>,
}

impl<P> CategoryStore<P> {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            expected_dimension: None,
        }
    }

    /// Store that only accepts patterns of `dimension` elements.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            categories: Vec::new(),
            expected_dimension: Some(dimension),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn expected_dimension(&self) -> Option<usize> {
        self.expected_dimension
    }

    /// Reject a pattern whose dimension differs from the fixed one.
    ///
    /// An unfixed store accepts anything; the dimension is pinned by
    /// [`pin_dimension`](Self::pin_dimension) on the first successful learn.
    pub fn check_dimension(&self, pattern: &Pattern) -> Result<()> {
        match self.expected_dimension {
            Some(expected) if expected != pattern.dimensions() => Err(ArtError::DimensionMismatch {
                expected,
                got: pattern.dimensions(),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn pin_dimension(&mut self, dimension: usize) {
        if self.expected_dimension.is_none() {
            self.expected_dimension = Some(dimension);
        }
    }

    pub fn get(&self, index: usize) -> Option<&Category<P>> {
        self.categories.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category<P>> {
        self.categories.iter()
    }

    pub(crate) fn as_slice(&self) -> &[Category<P>] {
        &self.categories
    }

    /// Append a category and return its index.
    pub(crate) fn push(&mut self, prototype: P) -> usize {
        self.categories.push(Category {
            prototype,
            update_count: 0,
        });
        self.categories.len() - 1
    }

    /// Mutate a prototype in place and bump its update counter.
    pub(crate) fn update_with<F>(&mut self, index: usize, f: F) -> bool
    where
        F: FnOnce(&mut P),
    {
        match self.categories.get_mut(index) {
            Some(category) => {
                f(&mut category.prototype);
                category.update_count += 1;
                true
            }
            None => false,
        }
    }

    /// Used slots over allocated slots of the arena (0.0 when nothing is allocated).
    pub fn memory_efficiency(&self) -> f64 {
        let capacity = self.categories.capacity();
        if capacity == 0 {
            return 0.0;
        }
        self.categories.len() as f64 / capacity as f64
    }
}

impl<P> Default for CategoryStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, P> IntoIterator for &'a CategoryStore<P> {
    type Item = &'a Category<P>;
    type IntoIter = std::slice::Iter<'a, Category<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
