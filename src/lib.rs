//! Health Intake — multi-step onboarding wizard for a personalized health
//! profile.

pub mod catalog;
pub mod channels;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;
