pub mod generator;
mod git;
mod materializer;
mod prober;
mod snapshots;
mod supervisor;
mod templates;

pub use git::*;
pub use materializer::*;
pub use prober::*;
pub use snapshots::*;
pub use supervisor::*;
pub use templates::*;

pub use generator::CodeGenerator;
