mod pdf;

pub use pdf::{DocumentSnapshot, PageText, SnapshotCache};
