pub mod metar;
pub mod obscuration;
pub mod optional_data;
pub mod pressure;
pub mod temperature;
pub mod timestamp;
pub mod wind;
