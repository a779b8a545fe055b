//! `sessionkeep`: drive session identity against a file-backed host, one
//! page load per invocation.

pub mod cli;
pub mod page;
