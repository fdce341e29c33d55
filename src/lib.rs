pub mod cli;
pub mod internal;
