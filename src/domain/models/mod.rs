mod backend;
mod command;
mod error;
mod outcome;
mod profile;
mod project;
mod session;

pub use backend::*;
pub use command::*;
pub use error::*;
pub use outcome::*;
pub use profile::*;
pub use project::*;
pub use session::*;
