//! Prelude module for convenient imports.
//!
//! Re-exports the types most callers need, so one import gets a working
//! surface:
//!
//! ```rust,ignore
//! use infergate::prelude::*;
//!
//! let model = ModelHandle::with_defaults(transport)?;
//! model.load_openvino("/models/model.xml", "/models/model.bin")?;
//! ```

pub use crate::backend::{
    BackendKind, CalibrationOptions, NetworkKind, Precision, TfLoadOptions,
};
pub use crate::error::{ModelError, ModelResult};
pub use crate::gateway::{EngineFault, EngineTransport};
pub use crate::model::ModelHandle;
pub use crate::tensor::{PredictInput, PredictOutput, Tensor};
