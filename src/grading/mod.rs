pub mod aggregate;
pub mod bounds;
pub mod devoicing;
pub mod grader;
pub mod result;
