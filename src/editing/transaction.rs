use crate::doc::{DocAccess, Slice};

use super::map::Mapping;
use super::steps::{Step, StepError, StepResult};

/// Sequences steps and plain replaces against a document, tracking the
/// cumulative position map.
///
/// The transaction owns the current document value; every edit swaps in a
/// fresh document and appends the edit's map to [`mapping`], so positions
/// computed against the starting document can be carried forward. A
/// failed edit changes nothing.
///
/// [`mapping`]: Transaction::mapping
#[derive(Debug, Clone)]
pub struct Transaction<D: DocAccess> {
    doc: D,
    steps: Vec<Step>,
    mapping: Mapping,
}

impl<D: DocAccess> Transaction<D> {
    pub fn new(doc: D) -> Self {
        Self {
            doc,
            steps: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// The document with all edits so far applied.
    pub fn doc(&self) -> &D {
        &self.doc
    }

    /// Steps applied so far. Plain replaces are recorded only in the
    /// mapping.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Cumulative map across every edit in this transaction.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Apply a step atomically: on failure the document and mapping are
    /// left as they were.
    pub fn step(&mut self, step: Step) -> Result<(), StepError> {
        let StepResult { doc, map } = step.apply(&self.doc)?;
        self.doc = doc;
        self.mapping.push(map);
        self.steps.push(step);
        Ok(())
    }

    /// Apply a plain replace through the document accessor.
    pub fn replace(&mut self, from: usize, to: usize, slice: &Slice) -> Result<(), StepError> {
        let replaced = self.doc.replace(from, to, slice)?;
        self.doc = replaced.doc;
        self.mapping.push(replaced.map);
        Ok(())
    }

    /// Finish the transaction, handing back the edited document.
    pub fn into_doc(self) -> D {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{Doc, Node, Schema};
    use crate::editing::{Bias, MoveStep};
    use pretty_assertions::assert_eq;

    fn p(text: &str) -> Node {
        Node::elem("paragraph", vec![Node::text(text)])
    }

    fn two_paragraphs() -> Doc {
        Doc::new(Schema::basic(), vec![p("1234567890"), p("abcdefghij")]).unwrap()
    }

    #[test]
    fn test_transaction_sequences_edits_and_maps() {
        let mut tr = Transaction::new(two_paragraphs());

        let insert = Slice::new(vec![Node::text("XX")], 0, 0).unwrap();
        tr.replace(6, 6, &insert).unwrap();
        tr.step(Step::Move(MoveStep::new(0, 14, 26).unwrap())).unwrap();

        assert_eq!(
            tr.doc().nodes(),
            vec![p("abcdefghij"), p("12345XX67890")]
        );
        assert_eq!(tr.steps().len(), 1);
        // position 20 in the original document (inside the second
        // paragraph) ends up at the front
        assert_eq!(tr.mapping().map(20, Bias::End), 8);
    }

    #[test]
    fn test_failed_step_leaves_transaction_untouched() {
        let mut tr = Transaction::new(two_paragraphs());
        let result = tr.step(Step::Move(MoveStep::new(0, 12, 40).unwrap()));

        assert!(result.is_err());
        assert_eq!(tr.doc(), &two_paragraphs());
        assert!(tr.steps().is_empty());
        assert!(tr.mapping().maps().is_empty());
    }
}
