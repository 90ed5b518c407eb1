//! Controller Module
//!
//! Orchestrates `Get`: cache check, anti-loop guarded peer sweep, origin
//! fallback and cache population.

mod loader;
mod machine;
mod registry;
mod token;


pub use loader::{LoaderFuture, MapLoader, NoOrigin, OriginLoader};
pub use machine::Controller;
pub use registry::Controllers;
pub use token::{mint_token, token_age, ActiveTokens, SweepBudget, TokenGuard};
