pub mod backends;
pub mod gpu;
