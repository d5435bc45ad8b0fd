pub mod check_job;
pub mod detector;
pub mod reader;
pub mod scheduler;
