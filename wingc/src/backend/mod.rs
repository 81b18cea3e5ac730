pub mod actions;
pub mod builtins;
pub mod function;
pub mod generator;
pub mod layout;
pub mod linker;
pub mod strategy;
