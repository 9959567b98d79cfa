pub mod codegen;
pub mod config;
pub mod design;
pub mod error;
pub mod extract;
pub mod graph;
pub mod validate;
pub mod wasm;
