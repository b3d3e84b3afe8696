use crate::traits::model::Record;

/// Destination of `fetch`: one record or a sequence of records
pub trait FetchTarget: Sized + Send {
    type Item: Record;

    /// Build the destination from scanned rows; `None` when a required record is missing
    fn from_items(items: Vec<Self::Item>) -> Option<Self>;

    fn items_mut(&mut self) -> &mut [Self::Item];
}

impl<T: Record> FetchTarget for T {
    type Item = T;

    fn from_items(items: Vec<T>) -> Option<Self> {
        items.into_iter().next()
    }

    fn items_mut(&mut self) -> &mut [T] {
        std::slice::from_mut(self)
    }
}

/// Missing keys are dropped; row order follows the store
impl<T: Record> FetchTarget for Vec<T> {
    type Item = T;

    fn from_items(items: Vec<T>) -> Option<Self> {
        Some(items)
    }

    fn items_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}
