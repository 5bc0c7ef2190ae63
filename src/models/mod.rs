pub mod owm;
pub mod open_meteo;
pub mod world_tides;
