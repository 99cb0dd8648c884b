pub mod sort_order;
pub mod visibility;

pub use sort_order::{SortOrder, Sortable};
pub use visibility::Visibility;
