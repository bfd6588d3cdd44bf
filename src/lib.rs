pub mod api;
pub mod assets;
pub mod config;
pub mod http_client;
pub mod kart_record;
pub mod provider;
pub mod query_cache;
pub mod state;
pub mod time_format;
pub mod track_ranking;
