//! Terminal explorer for the Abstract design hierarchy.
//!
//! Layers, top down: `cli` parses and prints, `application` holds the
//! hierarchy and credential services, `infrastructure` talks to the REST API,
//! the OS secret store and the URL launcher, `domain` holds the pure node and
//! link model.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
