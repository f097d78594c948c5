pub mod feed;
pub mod pattern_decode;
pub mod pattern_registry;
pub mod pattern_view;
pub mod payload;
pub mod performance;
pub mod records;
pub mod settings;
pub mod sportradar;
pub mod state;
pub mod store;
