pub mod dump;
pub mod engine;
pub mod filter;
pub mod handler;
pub mod master;
pub mod schema;
