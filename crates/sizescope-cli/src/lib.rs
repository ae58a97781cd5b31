/// sizescope CLI: terminal frontend over `sizescope-core`.
///
/// This crate only presents: it starts a scan, polls its progress, and
/// renders the finished tree or category view. Business logic lives in
/// `sizescope-core`.
pub mod app;
pub mod args;
pub mod report;

pub use app::run;
pub use args::{Args, OutputFormat, View};
