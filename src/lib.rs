pub mod config;
pub mod geolocation;
pub mod http;
pub mod log;
pub mod utils;
pub mod weather;

pub use crate::config::{AppConfig, load_app_config};
pub use crate::geolocation::{Coordinates, GeolocationError, LocationProvider, get_geolocation};
pub use crate::http::{CallOptions, ClientConfig, ClientError, HttpClient, HttpError};
pub use crate::weather::{Weather, WeatherData, WeatherParams};
