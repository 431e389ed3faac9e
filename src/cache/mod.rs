mod structs;

pub use structs::{Cache, ImportStamp};
