pub mod scheduler;
pub mod shutdown;
pub mod startup;
