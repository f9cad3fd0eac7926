mod attendance;
mod seed;

pub use attendance::{AttendanceDb, DatabaseError};
pub use seed::seed_sample_database;
