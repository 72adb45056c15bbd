//! Settings shared by every folio crate.

pub mod resolve;
pub mod settings;

pub use resolve::ResolvedBackend;
pub use settings::Settings;
