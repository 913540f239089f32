pub mod coordinator;
pub mod probe;
pub mod scanner;
