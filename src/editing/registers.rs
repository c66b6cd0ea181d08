use crate::doc::{Attrs, ChildNode, Doc, DocAccess, DocError, NodeSpec, Schema, Slice};

use super::map::Bias;
use super::steps::{MoveStep, Step, StepError};
use super::transaction::Transaction;

/// Kind of the trailing container holding register entries.
pub const REGISTER_SLOT: &str = "register_slot";
/// Entry kind for block-level content.
pub const REGISTER_BLOCK: &str = "register_block";
/// Entry kind for inline content.
pub const REGISTER_INLINE: &str = "register_inline";

/// Failures in the register cut/paste flow.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Document has no trailing register slot")]
    MissingSlot,
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Doc(#[from] DocError),
}

/// Extend a schema with the register node kinds.
///
/// The rule that a conforming document keeps a `register_slot` as its
/// last structural child belongs to the host's validation layer; the
/// helpers below check for the slot at use time.
pub fn with_registers(schema: &Schema) -> Schema {
    let mut extended = schema.clone();
    extended.add(NodeSpec::block(REGISTER_SLOT));
    extended.add(NodeSpec::block(REGISTER_BLOCK));
    extended.add(NodeSpec::block(REGISTER_INLINE));
    extended
}

/// Cut `from..to` into a fresh register entry.
///
/// Appends an empty entry of the inline or block kind at the end of the
/// register slot, recording the selection's open depths as the entry's
/// attributes, then moves the selection into it. Serializing the cut
/// content for the system clipboard stays with the host.
pub fn handle_cut(doc: &Doc, from: usize, to: usize) -> Result<Transaction<Doc>, RegisterError> {
    let slice = doc.slice(from, to)?;
    let slot = register_slot(doc)?;

    let kind = if slice.has_inline_content(doc.schema()) {
        REGISTER_INLINE
    } else {
        REGISTER_BLOCK
    };
    let entry = Slice::node(
        kind,
        Attrs {
            open_start: slice.open_start(),
            open_end: slice.open_end(),
        },
    );

    // end of the slot's content, just before its closing boundary
    let entry_pos = slot.start + slot.size - 1;
    let mut tr = Transaction::new(doc.clone());
    tr.replace(entry_pos, entry_pos, &entry)?;
    tr.step(Step::Move(MoveStep::new(from, to, entry_pos + 1)?))?;
    Ok(tr)
}

/// Paste `slice` at `dest` by moving matching register content.
///
/// Searches the slot for an entry whose stored content and open depths
/// match the incoming slice exactly. On a hit, the entry's inner content
/// (between the coercion wrappers, which reproduces the original open
/// fragment) is moved to `dest` and the emptied entry is removed. `None`
/// means no entry matched and the host should fall back to a plain
/// structural insert.
pub fn handle_paste(
    doc: &Doc,
    slice: &Slice,
    dest: usize,
) -> Result<Option<Transaction<Doc>>, RegisterError> {
    let slot = register_slot(doc)?;
    let Some(entry) = find_matching_register(doc, &slot, slice) else {
        return Ok(None);
    };

    let open_start = entry.attrs.open_start;
    let open_end = entry.attrs.open_end;
    let from = entry.start + 1 + open_start;
    let to = entry.start + entry.size - 1 - open_end;

    let mut tr = Transaction::new(doc.clone());
    tr.step(Step::Move(MoveStep::new(from, to, dest)?))?;

    // the entry now holds only its coercion wrappers; drop it whole
    let entry_pos = tr.mapping().map(entry.start, Bias::End);
    let leftover = 2 + open_start + open_end;
    tr.replace(entry_pos, entry_pos + leftover, &Slice::empty())?;
    Ok(Some(tr))
}

/// The trailing register slot, required to close the document.
fn register_slot(doc: &Doc) -> Result<ChildNode, RegisterError> {
    let slot = doc.last_child().ok_or(RegisterError::MissingSlot)?;
    if slot.kind != REGISTER_SLOT || slot.start + slot.size != doc.size() {
        return Err(RegisterError::MissingSlot);
    }
    Ok(slot)
}

/// Find a register entry whose content and open depths match `slice`.
fn find_matching_register(doc: &Doc, slot: &ChildNode, slice: &Slice) -> Option<ChildNode> {
    doc.children_in(slot.start + 1, slot.start + slot.size - 1)
        .into_iter()
        .find(|entry| {
            entry.attrs.open_start == slice.open_start()
                && entry.attrs.open_end == slice.open_end()
                && doc.tokens()[entry.start + 1..entry.start + entry.size - 1] == *slice.content()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Node;
    use pretty_assertions::assert_eq;

    fn p(text: &str) -> Node {
        Node::elem("paragraph", vec![Node::text(text)])
    }

    fn slot(entries: Vec<Node>) -> Node {
        Node::elem(REGISTER_SLOT, entries)
    }

    fn doc_with_slot(mut content: Vec<Node>, entries: Vec<Node>) -> Doc {
        content.push(slot(entries));
        Doc::new(with_registers(&Schema::basic()), content).unwrap()
    }

    #[test]
    fn test_with_registers_adds_the_three_kinds() {
        let schema = with_registers(&Schema::basic());

        assert!(schema.contains(REGISTER_SLOT));
        assert!(schema.contains(REGISTER_BLOCK));
        assert!(schema.contains(REGISTER_INLINE));
        assert!(schema.contains("paragraph"));
    }

    #[test]
    fn test_cut_moves_inline_selection_into_a_fresh_entry() {
        let doc = doc_with_slot(vec![p("hello world")], vec![]);

        // cut "hello": positions 1..6 inside the paragraph
        let tr = handle_cut(&doc, 1, 6).unwrap();

        assert_eq!(
            tr.doc().nodes(),
            vec![
                p(" world"),
                slot(vec![Node::elem(REGISTER_INLINE, vec![Node::text("hello")])]),
            ]
        );
    }

    #[test]
    fn test_cut_of_open_selection_records_depths_on_the_entry() {
        let doc = doc_with_slot(vec![p("1234567890"), p("abcdefghij")], vec![]);

        // positions 10..14 span the paragraph boundary
        let tr = handle_cut(&doc, 10, 14).unwrap();
        let slot_node = tr.doc().last_child().unwrap();
        let entries = tr
            .doc()
            .children_in(slot_node.start + 1, slot_node.start + slot_node.size - 1);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, REGISTER_BLOCK);
        assert_eq!(entries[0].attrs.open_start, 1);
        assert_eq!(entries[0].attrs.open_end, 1);
        assert_eq!(tr.doc().nodes()[0], p("123456789bcdefghij"));
    }

    #[test]
    fn test_cut_without_slot_is_refused() {
        let doc = Doc::new(with_registers(&Schema::basic()), vec![p("hello")]).unwrap();

        assert!(matches!(
            handle_cut(&doc, 1, 3),
            Err(RegisterError::MissingSlot)
        ));
    }

    #[test]
    fn test_paste_moves_matching_content_and_drops_the_entry() {
        let doc = doc_with_slot(vec![p("hello world")], vec![]);
        let cut = handle_cut(&doc, 1, 6).unwrap();
        let after_cut = cut.into_doc();

        let slice = Slice::new(vec![Node::text("hello")], 0, 0).unwrap();
        // paste at the end of " world", position 7 inside the paragraph
        let tr = handle_paste(&after_cut, &slice, 7).unwrap().unwrap();

        assert_eq!(
            tr.doc().nodes(),
            vec![p(" worldhello"), slot(vec![])]
        );
    }

    #[test]
    fn test_paste_without_match_falls_back() {
        let doc = doc_with_slot(vec![p("hello world")], vec![]);
        let slice = Slice::new(vec![Node::text("nothing")], 0, 0).unwrap();

        assert!(handle_paste(&doc, &slice, 1).unwrap().is_none());
    }

    #[test]
    fn test_paste_requires_matching_open_depths() {
        let doc = doc_with_slot(vec![p("1234567890"), p("abcdefghij")], vec![]);
        let after_cut = handle_cut(&doc, 10, 14).unwrap().into_doc();

        // same closed content, but self-contained instead of open
        let closed = Slice::new(vec![p("0"), p("a")], 0, 0).unwrap();
        assert!(handle_paste(&after_cut, &closed, 1).unwrap().is_none());

        // the open form matches and pastes back across a boundary
        let open = Slice::new(vec![p("0"), p("a")], 1, 1).unwrap();
        let tr = handle_paste(&after_cut, &open, 10).unwrap().unwrap();
        assert_eq!(
            tr.doc().nodes(),
            vec![p("1234567890"), p("abcdefghij"), slot(vec![])]
        );
    }
}
