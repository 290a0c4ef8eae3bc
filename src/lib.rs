//! seerr-relay: keeps Seerr, Sonarr and Radarr in step.
//!
//! The interesting part is [services::remediation]: blacklisting a bad
//! delivery and asking Radarr/Sonarr to search for a replacement.

pub mod api;
pub mod app;
pub mod config;
pub mod services;
