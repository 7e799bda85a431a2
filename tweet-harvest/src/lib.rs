pub mod config;
pub mod harvester;
pub mod record;
pub mod session;
pub mod sink;
pub mod source;
