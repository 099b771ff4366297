pub mod job;
pub mod loaders;
pub mod materials;
pub mod outcome;
pub mod site;

pub use job::{JobDetails, UNKNOWN_FIELD};
pub use loaders::{load_sites_file, parse_sites_toml};
pub use materials::{ApplicationMaterials, GeneratedMaterials};
pub use outcome::ApplicationOutcome;
pub use site::{Locator, SiteConfig, StaticSite};
