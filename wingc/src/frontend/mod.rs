pub mod definition;
pub mod flatten;
pub mod lambda;
pub mod types;
