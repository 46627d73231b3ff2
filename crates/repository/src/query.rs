//! ListQuery - caller-supplied filter and ordering for listings

use std::cmp::Ordering;

type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;
type Comparator<'a, T> = Box<dyn Fn(&T, &T) -> Ordering + 'a>;

/// Optional filter and ordering applied to a listing before access control
pub struct ListQuery<'a, T> {
    filter: Option<Predicate<'a, T>>,
    order_by: Option<Comparator<'a, T>>,
}

impl<'a, T> ListQuery<'a, T> {
    /// Every non-deleted entity, in storage order
    pub fn new() -> Self {
        Self {
            filter: None,
            order_by: None,
        }
    }

    pub fn filter(mut self, predicate: impl Fn(&T) -> bool + 'a) -> Self {
        self.filter = Some(Box::new(predicate));
        self
    }

    pub fn order_by(mut self, compare: impl Fn(&T, &T) -> Ordering + 'a) -> Self {
        self.order_by = Some(Box::new(compare));
        self
    }

    /// Apply the filter, then the (stable) ordering
    pub(crate) fn apply(&self, mut entities: Vec<T>) -> Vec<T> {
        if let Some(filter) = &self.filter {
            entities.retain(|e| filter(e));
        }
        if let Some(order_by) = &self.order_by {
            entities.sort_by(|a, b| order_by(a, b));
        }
        entities
    }
}

impl<T> Default for ListQuery<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}
