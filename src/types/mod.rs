//! Type definitions

pub mod dedup;
pub mod optimizer;
pub mod reassignment;
pub mod record;
pub mod route;

pub use dedup::*;
pub use optimizer::*;
pub use reassignment::*;
pub use record::*;
pub use route::*;
