//! Workstation Troubleshooting Assistant
//!
//! This crate runs a troubleshooting session: it collects system and
//! hardware diagnostics, lets the operator pick symptom categories, and
//! packages everything into one compressed archive for support staff.
//!
//! # Features
//!
//! - **Report assembly**: every diagnostic utility output becomes a labelled
//!   section; missing or failing tools are recorded, never fatal
//! - **Symptom bundles**: battery, storage, networking and temperature
//! - **Archive packaging**: optional display-manager and X server logs are
//!   included only when present
//! - **Cleanup**: intermediate files are removed on success, error or signal
//!
//! # Example
//!
//! ```no_run
//! use troubleshoot_assist::{
//!     cleanup::CleanupRegistry,
//!     collectors::{Category, SystemSummary},
//!     config::AssistConfig,
//!     controller::run_unattended,
//!     runner::SystemRunner,
//!     session::{Session, SessionOptions},
//! };
//!
//! let registry = CleanupRegistry::new();
//! let options = SessionOptions::detect(AssistConfig::default()).unwrap();
//! let mut session = Session::open(options, &SystemRunner, &registry).unwrap();
//! session.collect_base(&SystemSummary::collect());
//!
//! let outcome = run_unattended(session, &[Category::Storage]).unwrap();
//! println!("{}", outcome.archive.path.display());
//! ```

pub mod archive;
pub mod capability;
pub mod cleanup;
pub mod cli;
pub mod collectors;
pub mod config;
pub mod controller;
pub mod error;
pub mod menu;
pub mod report;
pub mod runner;
pub mod session;

pub use error::{Error, Result};
pub use session::Session;
