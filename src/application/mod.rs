pub mod cli;
pub mod session_loop;
