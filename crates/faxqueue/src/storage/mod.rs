pub mod atomic;
pub mod filesystem;

pub use atomic::{read_json, read_json_object, write_json_atomic};
