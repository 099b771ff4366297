pub mod element_waiter;
pub mod form_filler;
pub mod job_extractor;
pub mod outcome_journal;
pub mod site_registry;

pub use element_waiter::ElementWaiter;
pub use form_filler::FormFiller;
pub use job_extractor::JobDetailExtractor;
pub use outcome_journal::{JournaledReporter, OutcomeJournal};
pub use site_registry::SiteRegistry;
