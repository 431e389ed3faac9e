pub mod catalog_import;
pub mod rating_period;
pub mod tournament_import;
