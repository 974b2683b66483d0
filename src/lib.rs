//! infergate - A thread-safe facade for serving pre-trained models on an
//! external inference engine.
//!
//! The crate loads one of several heterogeneous model formats (native
//! checkpoints, Caffe, TensorFlow, OpenVINO IRs, calibrated int8 variants)
//! behind one uniform [`ModelHandle`], then runs inference against that
//! handle with a bounded degree of concurrency. Tensor computation happens
//! in an external engine reached through the [`gateway::EngineTransport`]
//! seam; this crate implements the decision logic only: which load command
//! to issue, with which validated parameters, and how to keep one handle
//! safe under concurrent callers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use infergate::prelude::*;
//!
//! let model = ModelHandle::new(transport, 4, Precision::Single)?;
//! model.load_tf(
//!     "/models/frozen.pb",
//!     TfLoadOptions::with_backend("openvino").with_model_type("ssd_inception_v2_coco"),
//! )?;
//! let output = model.predict(input_tensor)?;
//! ```
//!
//! ## Module Organization
//!
//! - [`model`] - [`ModelHandle`]: construction, the `load*` family, `predict`
//! - [`backend`] - backend tags and validated load-request payloads
//! - [`gateway`] - the engine call boundary and its wire encoding
//! - [`gate`] - the admission gate bounding concurrent predict calls
//! - [`tensor`] - tensor values and predict input/output shapes
//! - [`error`] - the [`ModelError`] taxonomy

pub mod backend;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod model;
pub mod tensor;

pub mod prelude;

pub use backend::{
    BackendKind, CalibrationOptions, LoadRequest, NetworkKind, Precision, TfLoadOptions,
    TfOpenVinoRequest,
};
pub use error::{ModelError, ModelResult};
pub use gateway::{EngineFault, EngineGateway, EngineRef, EngineTransport};
pub use model::ModelHandle;
pub use tensor::{PredictInput, PredictOutput, Tensor};
