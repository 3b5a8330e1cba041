mod storage;

pub use storage::{load_request, load_snapshot, save_snapshot, snapshot_file_name};
