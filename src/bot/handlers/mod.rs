//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete.

/// Autocomplete handlers for envelope, project, account and provision labels
pub mod autocomplete;
