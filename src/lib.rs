//! MagnetCraft Admin Client
//!
//! This crate provides the admin side of the MagnetCraft storefront: a report
//! transport over the backend REST API, the view-state controller driving the
//! report manager, the admin dashboard projections, and the storefront
//! navigation header model.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod admin;
pub mod config;
pub mod controller;
pub mod errors;
pub mod models;
pub mod navigation;
pub mod transport;

pub use admin::{AdminShell, AdminTab, OverviewMetrics};
pub use config::{load_config, ClientConfig};
pub use controller::{ReportController, ReportViewState};
pub use errors::{TransportError, NETWORK_ERROR_MESSAGE};
pub use models::OperationResult;
pub use transport::{AdminDirectory, HttpReportClient, ReportTransport};
