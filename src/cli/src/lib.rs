//! nexus-route CLI - route APT, pip and Docker pulls through a Nexus proxy.

pub mod commands;
pub mod context;
pub mod output;
pub mod paths;
pub mod system;
