pub mod backup;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod geometry;
pub mod icons;
pub mod model;
pub mod notify;
pub mod observability;
pub mod persistence;
pub mod render;
pub mod store;
pub mod ticker;
