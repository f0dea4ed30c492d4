pub mod kernel;
pub mod tools;
