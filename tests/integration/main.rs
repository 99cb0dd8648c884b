mod fake;

mod favorites;
mod history;
mod lists;
mod profile;
mod search;

pub use self::fake::*;
pub use self::helper::*;
