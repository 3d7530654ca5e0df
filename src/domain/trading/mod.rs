pub mod decision;
pub mod types;
