//! Data layer: catalog access, queue construction, favorites and types

pub mod catalog;
pub mod favorites;
pub mod queue;
pub mod queue_builder;
pub mod source;
pub mod types;
