
mod student_tests;
mod teacher_tests;
