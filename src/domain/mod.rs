// Domain-specific error types
pub mod errors;

// Model, dataset and feature-pipeline contracts
pub mod ml;

// Port interfaces
pub mod ports;

// Core trading domain
pub mod trading;
