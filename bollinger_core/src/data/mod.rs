pub mod loader;
pub mod price_series;
