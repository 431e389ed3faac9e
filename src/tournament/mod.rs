pub mod best_coast;
pub mod columns;
pub mod dispatcher;
pub mod generic;
pub mod tabletop;

pub use dispatcher::{import_tournament, import_tournament_on, placeholder_metadata};
