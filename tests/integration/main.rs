//! Integration tests for medium-sync
//!
//! Uses wiremock as a stand-in relay and verifies the acquisition
//! fallback chain, article extraction and bulk enrichment end to end.

mod common;

mod test_acquire;
mod test_enrich;
