//! Embedding provider implementations.

pub mod ollama;
