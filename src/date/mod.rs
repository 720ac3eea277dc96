pub mod month;
pub mod season;

pub use month::{month_index_from_token, month_label, parse_date_only, wrapped_month_distance};
pub use season::{
    normalize_preferred_seasons, season_for_month_index, season_from_value, season_overlap,
    seasons_from_value, Season, SeasonOverlap,
};
