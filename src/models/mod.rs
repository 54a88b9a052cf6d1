pub mod courses;
pub mod enrollments;
pub mod support_calls;
pub mod users;
