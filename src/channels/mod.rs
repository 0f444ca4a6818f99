//! Front ends that drive the onboarding wizard.

pub mod cli;

pub use cli::CliWizard;
