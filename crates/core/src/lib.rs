pub mod config;
pub mod principal;

pub use config::Config;
pub use principal::Principal;
