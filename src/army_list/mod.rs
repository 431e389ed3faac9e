pub mod detachment;

pub use detachment::extract_detachment;
