//! Issue triage dashboard for a GitHub repository: an issue client that
//! always degrades to renderable data, an AI assistant that always returns
//! a usable result, and the controller that ties them to local state.

pub mod ai;
pub mod config;
pub mod controller;
pub mod github;
pub mod http;
pub mod launch;
pub mod notes;
pub mod report;
pub mod store;
