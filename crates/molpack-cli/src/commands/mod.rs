pub mod pack;
pub mod plan;
