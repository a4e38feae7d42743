pub mod dataset;
pub mod warehouse;
