pub mod dates;
pub mod extractor;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod sql;
pub mod student_number;
pub mod validate;
pub mod youtube;

pub use extractor::{
    SafeBlockIdI64, SafeClassIdI64, SafeCourseIdI64, SafeIDI64, SafeQuestionIdI64,
    SafeStudentIdI64, SafeSubmissionIdI64, SafeTestIdI64,
};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;
