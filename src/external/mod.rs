pub mod composite_provider;
pub mod csv_provider;
pub mod fund_scraper;
pub mod json_provider;
pub mod message_transport;
pub mod price_provider;
