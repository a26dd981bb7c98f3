pub mod display;
pub mod registry;
