//! RepoBridge - GitHub repository to project catalogue bridge
//!
//! RepoBridge lists the GitHub repositories known to a project-service backend
//! and converts selected ones into tracked project entries, with single and
//! bulk create/delete support.
//!
//! ## Core Features
//!
//! - **Repository browsing**: Fetch the repository catalogue from the backend
//! - **Project linking**: Create and delete project entries per repository
//! - **Bulk operations**: Batched create/delete over the current selection
//! - **Role-based gating**: Static action descriptors registered at startup
//! - **Configuration Management**: YAML-based configuration with XDG compliance
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`service`]: Project service HTTP client and wire types
//! - [`reconcile`]: Repository/project reconciliation state
//! - [`permissions`]: Action descriptors and grant registry
//! - [`tui`]: Interactive terminal front end

pub mod config;
pub mod permissions;
pub mod reconcile;
pub mod service;
pub mod tui;

pub use config::Config;
pub use permissions::{ActionDescriptor, ActionProvider, ActionRegistry, ACTIONS};
pub use reconcile::{Alert, AlertVariant, Reconciler};
pub use service::{HttpProjectService, Project, ProjectService, Repository};
