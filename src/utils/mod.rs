pub mod duration;
pub mod lyrics;
