//! JSON request parsing, replies and the readers used by the command-line
//! driver.

pub mod json;
