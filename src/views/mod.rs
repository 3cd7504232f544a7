pub mod pages;
pub mod projection;

pub use projection::{Mutation, Pending, TaskProjection};
