pub mod regime;
pub mod scaling;
pub mod technicals;
