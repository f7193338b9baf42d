//! Transient "Resolving…" marker standing in for a query while it is being
//! answered

use crate::model::document::{Document, TextRun};
use crate::model::transaction::{EditError, Transaction};
use crate::state::EditorState;
use std::ops::Range;

/// Text shown in place of a query while it is in flight
pub const RESOLVING_SENTINEL: &str = "Resolving\u{2026}";

/// Last known span of a placeholder. Only a hint: always re-validate with
/// [`locate`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub from: usize,
    pub to: usize,
}

/// Replace `[from, to)` with `sentinel` in one transaction
///
/// The sentinel inherits the marks at `from`; the cursor ends up after it.
pub fn insert(
    state: &mut EditorState,
    from: usize,
    to: usize,
    sentinel: &str,
) -> Result<Locator, EditError> {
    let marks = state.marks_at(from);
    let tr = Transaction::new("insert placeholder").replace_text(
        from,
        to,
        vec![TextRun::with_marks(sentinel, &marks)],
    );
    state.apply(tr)?;
    Ok(Locator {
        from,
        to: from + sentinel.chars().count(),
    })
}

/// Find the placeholder in the current document
///
/// Uses the locator span when it still holds the sentinel, otherwise the
/// first occurrence of the sentinel in document order.
pub fn locate(doc: &Document, locator: Locator, sentinel: &str) -> Option<Range<usize>> {
    if locator.to <= doc.content_size()
        && doc.text_between(locator.from, locator.to).as_deref() == Some(sentinel)
    {
        return Some(locator.from..locator.to);
    }
    let found = doc.find_text(sentinel);
    if found.is_some() {
        tracing::debug!(
            "placeholder moved from {}..{} to {:?}",
            locator.from,
            locator.to,
            found
        );
    }
    found
}
