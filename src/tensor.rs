//! Tensor values and their wire encoding.
//!
//! Tensors are opaque to this crate: an [`ndarray::ArrayD<f32>`] with its
//! shape metadata, carried unchanged between the caller and the engine.
//! This module pins the `{shape, data}` wire object the engine expects and
//! the single-vs-batch shapes of a predict call: a single tensor in yields
//! a single tensor out, a sequence in yields a sequence out of the same
//! length.

use crate::error::{ModelError, ModelResult};
use ndarray::{ArrayD, IxDyn};
use serde_json::{json, Value};

/// In-process tensor representation.
pub type Tensor = ArrayD<f32>;

/// Input to a predict call: one tensor, or an ordered sequence of them.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictInput {
    Single(Tensor),
    Batch(Vec<Tensor>),
}

/// Output of a predict call; mirrors the shape of the input.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutput {
    Single(Tensor),
    Batch(Vec<Tensor>),
}

impl From<Tensor> for PredictInput {
    fn from(tensor: Tensor) -> Self {
        PredictInput::Single(tensor)
    }
}

impl From<Vec<Tensor>> for PredictInput {
    fn from(tensors: Vec<Tensor>) -> Self {
        PredictInput::Batch(tensors)
    }
}

impl PredictOutput {
    /// Unwrap a single-tensor output. Returns `None` for batch outputs.
    pub fn into_single(self) -> Option<Tensor> {
        match self {
            PredictOutput::Single(t) => Some(t),
            PredictOutput::Batch(_) => None,
        }
    }

    /// Unwrap a batch output. A single output becomes a one-element batch.
    pub fn into_batch(self) -> Vec<Tensor> {
        match self {
            PredictOutput::Single(t) => vec![t],
            PredictOutput::Batch(ts) => ts,
        }
    }
}

/// Encode one tensor as the engine's `{shape, data}` wire object.
pub fn tensor_to_value(tensor: &Tensor) -> Value {
    json!({
        "shape": tensor.shape(),
        "data": tensor.iter().copied().collect::<Vec<f32>>(),
    })
}

/// Decode one `{shape, data}` wire object back into a tensor.
pub fn value_to_tensor(value: &Value) -> ModelResult<Tensor> {
    let shape: Vec<usize> = value
        .get("shape")
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::engine("malformed tensor: missing shape"))?
        .iter()
        .map(|d| {
            d.as_u64()
                .map(|d| d as usize)
                .ok_or_else(|| ModelError::engine("malformed tensor: non-integer dimension"))
        })
        .collect::<ModelResult<_>>()?;

    let data: Vec<f32> = value
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::engine("malformed tensor: missing data"))?
        .iter()
        .map(|x| {
            x.as_f64()
                .map(|x| x as f32)
                .ok_or_else(|| ModelError::engine("malformed tensor: non-numeric element"))
        })
        .collect::<ModelResult<_>>()?;

    ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|e| {
        ModelError::engine(format!("malformed tensor: shape/data mismatch: {e}"))
    })
}

/// Encode a predict input as the engine's wire shape: an ordered tensor
/// list plus a flag recording whether the caller passed a sequence.
pub fn encode_input(input: &PredictInput) -> (Value, bool) {
    match input {
        PredictInput::Single(t) => (Value::Array(vec![tensor_to_value(t)]), false),
        PredictInput::Batch(ts) => (
            Value::Array(ts.iter().map(tensor_to_value).collect()),
            true,
        ),
    }
}

/// Decode the engine's predict result back into the shape the caller
/// supplied: single in, single out; sequence in, sequence out.
pub fn decode_output(raw: &Value, was_batch: bool) -> ModelResult<PredictOutput> {
    let values = raw
        .as_array()
        .ok_or_else(|| ModelError::engine("malformed predict result: expected tensor list"))?;

    if was_batch {
        let tensors = values
            .iter()
            .map(value_to_tensor)
            .collect::<ModelResult<Vec<_>>>()?;
        return Ok(PredictOutput::Batch(tensors));
    }

    match values.as_slice() {
        [one] => Ok(PredictOutput::Single(value_to_tensor(one)?)),
        other => Err(ModelError::engine(format!(
            "malformed predict result: expected one tensor, got {}",
            other.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn sample_tensor() -> Tensor {
        arr2(&[[1.0_f32, 2.0], [3.0, 4.0]]).into_dyn()
    }

    #[test]
    fn test_tensor_wire_round_trip() {
        let tensor = sample_tensor();
        let decoded = value_to_tensor(&tensor_to_value(&tensor)).unwrap();
        assert_eq!(decoded, tensor);
        assert_eq!(decoded.shape(), &[2, 2]);
    }

    #[test]
    fn test_malformed_wire_tensor() {
        let missing_shape = serde_json::json!({ "data": [1.0] });
        assert!(matches!(
            value_to_tensor(&missing_shape),
            Err(ModelError::Engine(_))
        ));

        let mismatched = serde_json::json!({ "shape": [3], "data": [1.0, 2.0] });
        assert!(matches!(
            value_to_tensor(&mismatched),
            Err(ModelError::Engine(_))
        ));
    }

    #[test]
    fn test_single_input_encoding() {
        let (value, is_batch) = encode_input(&PredictInput::Single(sample_tensor()));
        assert!(!is_batch);
        assert_eq!(value.as_array().unwrap().len(), 1);

        let output = decode_output(&value, false).unwrap();
        assert_eq!(output, PredictOutput::Single(sample_tensor()));
    }

    #[test]
    fn test_batch_shape_symmetry() {
        for n in [0usize, 1, 3] {
            let batch: Vec<Tensor> = (0..n).map(|_| sample_tensor()).collect();
            let (value, is_batch) = encode_input(&PredictInput::Batch(batch.clone()));
            assert!(is_batch);

            let output = decode_output(&value, true).unwrap();
            assert_eq!(output, PredictOutput::Batch(batch));
        }
    }

    #[test]
    fn test_single_output_arity_enforced() {
        let two = serde_json::json!([
            { "shape": [1], "data": [1.0] },
            { "shape": [1], "data": [2.0] },
        ]);
        assert!(matches!(
            decode_output(&two, false),
            Err(ModelError::Engine(_))
        ));
    }
}
