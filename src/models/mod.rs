pub mod course;

pub use course::{Course, CourseChanges, CreateCourseRequest, NewCourse, UpdateCourseRequest};
