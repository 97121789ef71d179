//! Core engine for a GTD markdown space: the inline metadata token
//! codec, legacy-token migration, the open-document (tab) model with
//! dirty tracking and conflict handling, filesystem event
//! reconciliation, and the backlink/calendar scans built on top of the
//! codec.
//!
//! Rendering, dialogs and the rich block editor itself live elsewhere;
//! this crate exposes the operations they call and the capability
//! traits they implement.

use tracing_subscriber::EnvFilter;

pub mod calendar;
pub mod conflict;
pub mod context;
pub mod editor;
pub mod fsio;
pub mod index;
pub mod migrate;
pub mod reconcile;
pub mod settings;
pub mod space;
pub mod tabs;
pub mod tokens;
pub mod watch;

/// Install a formatted tracing subscriber filtered by `RUST_LOG`.
///
/// For embedders that do not bring their own subscriber. Safe to call
/// more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
