pub mod bbox;
pub mod constants;
pub mod map_stuffs;
pub mod misc;
pub mod simple_calculs;
