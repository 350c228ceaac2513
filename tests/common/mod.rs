#![allow(dead_code)]

#[cfg(unix)]
pub mod fixture;
pub mod grammars;
pub mod tracing;
