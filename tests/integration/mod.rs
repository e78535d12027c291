//! Integration tests for the Graft tree synchronization engine

mod config_integration;
mod manifest_ingestion;
mod sync_cycle;
