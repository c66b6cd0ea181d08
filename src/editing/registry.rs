use std::collections::BTreeMap;

use serde_json::Value;

use super::Step;

/// Serializer/deserializer pair for one step kind.
#[derive(Clone, Copy)]
pub struct StepCodec {
    /// Stable type tag, carried as the `kind` field of the wire form.
    pub tag: &'static str,
    pub encode: fn(&Step) -> Result<Value, CodecError>,
    pub decode: fn(Value) -> Result<Step, CodecError>,
}

/// Failures while encoding or decoding steps.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Step payload has no string \"kind\" field")]
    MissingKind,
    #[error("Unknown step kind: {0}")]
    UnknownKind(String),
    #[error("Malformed \"{tag}\" step: {source}")]
    Malformed {
        tag: &'static str,
        source: serde_json::Error,
    },
    #[error("Codec for \"{tag}\" cannot encode a \"{got}\" step")]
    WrongKind { tag: &'static str, got: &'static str },
}

/// Table mapping step type tags to their codecs.
///
/// Built once at startup and injected into whatever reads a step log or
/// network payload; it is not mutated afterwards. [`builtin`] covers the
/// step kinds this crate defines, and a host embedding additional kinds
/// registers them before handing the table out.
///
/// [`builtin`]: StepRegistry::builtin
#[derive(Default)]
pub struct StepRegistry {
    codecs: BTreeMap<&'static str, StepCodec>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with both built-in step kinds.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(StepCodec {
            tag: "move",
            encode: encode_move,
            decode: decode_move,
        });
        registry.register(StepCodec {
            tag: "invertedMove",
            encode: encode_inverted_move,
            decode: decode_inverted_move,
        });
        registry
    }

    /// Add a codec, replacing any previous entry for the same tag.
    pub fn register(&mut self, codec: StepCodec) {
        self.codecs.insert(codec.tag, codec);
    }

    pub fn codec(&self, tag: &str) -> Option<&StepCodec> {
        self.codecs.get(tag)
    }

    /// Encode a step into its tagged wire form.
    pub fn encode(&self, step: &Step) -> Result<Value, CodecError> {
        let codec = self
            .codec(step.kind())
            .ok_or_else(|| CodecError::UnknownKind(step.kind().to_string()))?;
        (codec.encode)(step)
    }

    /// Reconstruct a step from its tagged wire form.
    pub fn decode(&self, value: Value) -> Result<Step, CodecError> {
        let tag = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(CodecError::MissingKind)?;
        let codec = self
            .codec(tag)
            .ok_or_else(|| CodecError::UnknownKind(tag.to_string()))?;
        (codec.decode)(value)
    }
}

fn encode_tagged(tag: &'static str, step: &Step) -> Result<Value, CodecError> {
    if step.kind() != tag {
        return Err(CodecError::WrongKind {
            tag,
            got: step.kind(),
        });
    }
    serde_json::to_value(step).map_err(|source| CodecError::Malformed { tag, source })
}

fn encode_move(step: &Step) -> Result<Value, CodecError> {
    encode_tagged("move", step)
}

fn encode_inverted_move(step: &Step) -> Result<Value, CodecError> {
    encode_tagged("invertedMove", step)
}

fn decode_move(value: Value) -> Result<Step, CodecError> {
    serde_json::from_value::<crate::editing::MoveStep>(value)
        .map(Step::Move)
        .map_err(|source| CodecError::Malformed {
            tag: "move",
            source,
        })
}

fn decode_inverted_move(value: Value) -> Result<Step, CodecError> {
    serde_json::from_value::<crate::editing::InvertedMoveStep>(value)
        .map(Step::InvertedMove)
        .map_err(|source| CodecError::Malformed {
            tag: "invertedMove",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{Node, Slice};
    use crate::editing::{InvertedMoveStep, MoveStep};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_move_wire_form() {
        let registry = StepRegistry::builtin();
        let step = Step::Move(MoveStep::new(0, 12, 24).unwrap());

        let value = registry.encode(&step).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"kind": "move", "from": 0, "to": 12, "dest": 24})
        );
        assert_eq!(registry.decode(value).unwrap(), step);
    }

    #[test]
    fn test_inverted_move_wire_form_carries_content() {
        let registry = StepRegistry::builtin();
        let content = Slice::new(vec![Node::elem("paragraph", vec![Node::text("hi")])], 0, 0)
            .unwrap();
        let step = Step::InvertedMove(InvertedMoveStep::new(0, content, 12, 16).unwrap());

        let value = registry.encode(&step).unwrap();
        assert_eq!(value["kind"], "invertedMove");
        assert_eq!(value["deleteFrom"], 12);
        assert_eq!(value["deleteTo"], 16);
        assert_eq!(registry.decode(value).unwrap(), step);
    }

    #[test]
    fn test_unknown_kind_is_a_typed_error() {
        let registry = StepRegistry::builtin();
        let result = registry.decode(serde_json::json!({"kind": "replaceAround"}));

        assert!(matches!(result, Err(CodecError::UnknownKind(kind)) if kind == "replaceAround"));
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let registry = StepRegistry::builtin();

        assert!(matches!(
            registry.decode(serde_json::json!({"from": 0})),
            Err(CodecError::MissingKind)
        ));
    }

    #[test]
    fn test_decode_revalidates_construction_invariants() {
        let registry = StepRegistry::builtin();
        // dest inside the moved range must fail at decode time too
        let result =
            registry.decode(serde_json::json!({"kind": "move", "from": 0, "to": 12, "dest": 6}));

        assert!(matches!(result, Err(CodecError::Malformed { tag: "move", .. })));
    }
}
