//! Registry for hierarchical trading networks.
//!
//! Nodes (factories, retail networks, entrepreneurs) buy from one another in
//! supplier chains. The registry derives each node's hierarchy level, guards
//! the debt balance against general updates, refuses to delete nodes that
//! still supply others, and answers filtered queries and statistics.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
