pub mod toml_loader;

pub use toml_loader::{load_sites_file, parse_sites_toml};
