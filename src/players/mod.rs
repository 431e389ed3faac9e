pub mod matcher;

pub use matcher::{link_players, match_player_name, match_player_names, RosterIndex};
