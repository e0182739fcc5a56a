pub mod adapters;
pub mod demand;
pub mod models;
pub mod observability;
