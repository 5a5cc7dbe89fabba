pub mod app;
pub mod effect;
pub mod environment;
pub mod routes;
pub mod search;
pub mod store;

pub use app::run;
pub use environment::Environment;
pub use search::{Action, State};
pub use store::Store;
