pub mod content_id;
pub mod parser;
pub mod weapon;

pub use content_id::content_id;
pub use parser::{parse_catalog, CATALOG_FORMAT_VERSION};
