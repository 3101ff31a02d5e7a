pub mod file;
pub mod positions;
pub mod stdin;
