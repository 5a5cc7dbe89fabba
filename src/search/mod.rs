pub mod codec;
pub mod orchestrator;
pub mod reconciler;
mod reducer;

pub use codec::{ParamValue, SearchParams};
pub use reducer::{reduce, Action, State};
