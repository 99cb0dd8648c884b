pub mod auth;
pub mod configuration;
pub mod db;
pub mod error;
pub mod events;
pub mod model;
pub mod navigation;
pub mod policy;
pub mod providers;
pub mod search;
pub mod state;
pub mod store;
pub mod telemetry;

pub use error::{Error, ErrorKind, Outcome, ProviderResult};
pub use events::{EventBus, Subscription, Topic};
pub use policy::{SortOrder, Visibility};
