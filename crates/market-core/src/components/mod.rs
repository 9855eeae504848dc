//! ECS Components
//!
//! Agent identity plus the producer and consumer models.

pub mod agent;
pub mod consumer;
pub mod producer;

pub use agent::*;
pub use consumer::*;
pub use producer::*;
