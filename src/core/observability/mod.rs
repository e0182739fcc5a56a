#[macro_use]
pub mod macros;
pub mod provider;

pub use provider::init;
