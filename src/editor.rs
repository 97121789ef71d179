//! Seam to the external rich-block editor.
//!
//! The editor is an opaque capability with eventual-consistency
//! semantics: an insert is not guaranteed to be visible in the document
//! tree when the call returns, because its internal commit is
//! asynchronous. The insert is therefore modeled as two explicit
//! phases: submit ([`BlockEditor::insert_block`], returning a ticket)
//! and confirm ([`await_block`], bounded polling), so the asynchrony
//! is visible at the call site and testable with a mock.

use std::time::Duration;

use anyhow::Result;
use tracing::debug;

/// Identifier of a block inside the editor's document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(pub String);

/// What the editor reports about a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub content: String,
}

/// Receipt for a submitted insert; confirmation happens separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTicket {
    pub block_id: BlockId,
}

/// The capability surface this crate needs from the editor. Rendering
/// and everything else about it is out of scope.
pub trait BlockEditor {
    /// Block currently holding the cursor, if any.
    fn cursor_block(&self) -> Option<BlockId>;

    /// Submit an insert after the given block (or at the document end).
    /// The returned ticket is a promise, not a guarantee of visibility.
    fn insert_block(&mut self, after: Option<&BlockId>, content: &str) -> Result<BlockTicket>;

    fn update_block(&mut self, id: &BlockId, content: &str) -> Result<()>;

    fn find_block(&self, id: &BlockId) -> Option<BlockSnapshot>;

    /// Full document snapshot in document order.
    fn snapshot(&self) -> Vec<BlockSnapshot>;
}

/// Polling attempts before giving up on a submitted insert.
pub const AWAIT_ATTEMPTS: usize = 5;

/// Pause between polling attempts.
pub const AWAIT_INTERVAL: Duration = Duration::from_millis(40);

/// Confirm that a submitted insert has landed in the document tree.
///
/// Polls [`BlockEditor::find_block`] at most [`AWAIT_ATTEMPTS`] times,
/// [`AWAIT_INTERVAL`] apart. Fails soft: `None` on exhaustion, the
/// caller decides whether that matters.
pub fn await_block(editor: &dyn BlockEditor, ticket: &BlockTicket) -> Option<BlockSnapshot> {
    for attempt in 0..AWAIT_ATTEMPTS {
        if let Some(snapshot) = editor.find_block(&ticket.block_id) {
            return Some(snapshot);
        }
        if attempt + 1 < AWAIT_ATTEMPTS {
            std::thread::sleep(AWAIT_INTERVAL);
        }
    }
    debug!(block = %ticket.block_id.0, "insert not visible after {AWAIT_ATTEMPTS} attempts");
    None
}

/// Submit an insert at the cursor and wait for it to become visible.
pub fn insert_and_confirm(
    editor: &mut dyn BlockEditor,
    content: &str,
) -> Result<Option<BlockSnapshot>> {
    let after = editor.cursor_block();
    let ticket = editor.insert_block(after.as_ref(), content)?;
    Ok(await_block(editor, &ticket))
}
