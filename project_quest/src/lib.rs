pub mod area;
pub mod config;
pub mod entity;
pub mod formulas;
pub mod kinds;
pub mod outbox;
pub mod properties;
pub mod realm;
pub mod text;
pub mod world;
