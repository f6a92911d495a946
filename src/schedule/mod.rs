// src/schedule/mod.rs
pub mod assembler;
pub mod classifier;
pub mod models;
pub mod segmenter;

pub use models::DocumentResult;
