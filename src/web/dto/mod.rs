pub mod exams;
pub mod rubrics;
pub mod sessions;
