pub mod item;
pub mod plot;
pub mod series;
