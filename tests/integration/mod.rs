//! Integration tests for the document engine
//!
//! These tests exercise full flows against a real temp-directory space:
//! open/edit/save lifecycles, external-change reconciliation and
//! conflict resolution, and the backlink/calendar scans.

pub mod conflict_flow;
pub mod helpers;
pub mod scans;
pub mod tab_lifecycle;
pub mod watcher;
