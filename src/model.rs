//! The model handle: one loadable slot over one engine instance.
//!
//! A [`ModelHandle`] owns an opaque reference to an instance inside the
//! external engine. It starts unloaded, binds to exactly one backend
//! through a successful `load*` call, and from then on serves `predict`
//! requests, admitting at most `concurrency_limit` of them into the engine
//! at once. Dropping the handle releases the engine instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use infergate::{ModelHandle, Precision, TfLoadOptions};
//!
//! let model = ModelHandle::new(transport, 4, Precision::Single)?;
//! model.load_tf("/models/frozen.pb", TfLoadOptions::default())?;
//! let output = model.predict(input_tensor)?;
//! ```

use crate::backend::{BackendKind, CalibrationOptions, LoadRequest, Precision, TfLoadOptions};
use crate::error::{ModelError, ModelResult};
use crate::gate::AdmissionGate;
use crate::gateway::{encode, EngineGateway, EngineRef, EngineTransport};
use crate::tensor::{decode_output, PredictInput, PredictOutput};
use std::sync::{Arc, Mutex};

/// Thread-safe handle over one model instance in the external engine.
///
/// Loads are mutually exclusive: when several threads race to load, exactly
/// one wins the `Unloaded -> Loaded` transition and the rest observe
/// [`ModelError::AlreadyLoaded`]. Once loaded the handle never re-binds.
/// Predict calls may run concurrently up to the configured limit; callers
/// past the limit block until a slot frees. There is no timeout or
/// cancellation contract; callers needing one must wrap calls externally.
pub struct ModelHandle {
    gateway: EngineGateway,
    instance: EngineRef,
    concurrency_limit: usize,
    precision: Precision,
    /// `None` until the one successful load binds a backend.
    state: Mutex<Option<LoadRequest>>,
    gate: AdmissionGate,
}

impl ModelHandle {
    /// Create a handle backed by a fresh engine instance.
    ///
    /// `concurrency_limit` bounds concurrent predict calls and must be at
    /// least 1. Fails with [`ModelError::Configuration`] on a zero limit,
    /// or [`ModelError::Engine`] if the engine refuses the instance.
    ///
    /// If the engine answers `create` with anything other than an integer
    /// instance id, construction fails with [`ModelError::Engine`] and no
    /// handle exists; should the engine have allocated an instance despite
    /// the malformed reply, its id is unknown here and it cannot be
    /// released from this side.
    pub fn new(
        transport: Arc<dyn EngineTransport>,
        concurrency_limit: usize,
        precision: Precision,
    ) -> ModelResult<Self> {
        if concurrency_limit < 1 {
            return Err(ModelError::config("concurrency_limit must be at least 1"));
        }

        let gateway = EngineGateway::new(transport);
        let (command, args) = encode::create_call(concurrency_limit, precision);
        let raw = gateway.invoke(command, &args)?;
        let instance = raw
            .as_u64()
            .map(EngineRef)
            .ok_or_else(|| ModelError::engine("malformed create result: expected instance id"))?;

        log::info!("created {instance} (concurrency_limit={concurrency_limit})");
        Ok(Self {
            gateway,
            instance,
            concurrency_limit,
            precision,
            state: Mutex::new(None),
            gate: AdmissionGate::new(concurrency_limit),
        })
    }

    /// Handle with the original defaults: one concurrent predict call,
    /// single precision.
    pub fn with_defaults(transport: Arc<dyn EngineTransport>) -> ModelResult<Self> {
        Self::new(transport, 1, Precision::Single)
    }

    // ─── Loaders ────────────────────────────────────────────────────────

    /// Load a native framework checkpoint, with optional separate weights.
    pub fn load_native(&self, model_path: &str, weight_path: Option<&str>) -> ModelResult<()> {
        self.bind(LoadRequest::native(model_path, weight_path)?)
    }

    /// Load a Caffe prototxt + caffemodel pair.
    pub fn load_caffe(&self, model_path: &str, weight_path: &str) -> ModelResult<()> {
        self.bind(LoadRequest::caffe(model_path, weight_path)?)
    }

    /// Load an OpenVINO IR (xml structure file + bin weights file).
    pub fn load_openvino(&self, model_path: &str, weight_path: &str) -> ModelResult<()> {
        self.bind(LoadRequest::openvino(model_path, weight_path)?)
    }

    /// Load a calibrated int8 OpenVINO IR with a fixed input batch size.
    pub fn load_openvino_int8(
        &self,
        model_path: &str,
        weight_path: &str,
        batch_size: u32,
    ) -> ModelResult<()> {
        self.bind(LoadRequest::openvino_int8(model_path, weight_path, batch_size)?)
    }

    /// Load a TensorFlow model on either the TensorFlow runtime or, by
    /// conversion, the OpenVINO runtime. See [`TfLoadOptions`] for the
    /// branch selection and which options each branch reads.
    pub fn load_tf(&self, model_path: &str, options: TfLoadOptions) -> ModelResult<()> {
        self.bind(LoadRequest::tensorflow(model_path, &options)?)
    }

    /// Load an object-detection TensorFlow model as an OpenVINO IR.
    pub fn load_tf_object_detection_as_openvino(
        &self,
        model_path: &str,
        model_type: &str,
        pipeline_config_path: &str,
        extensions_config_path: &str,
    ) -> ModelResult<()> {
        self.bind(LoadRequest::tf_object_detection_as_openvino(
            model_path,
            model_type,
            pipeline_config_path,
            extensions_config_path,
        )?)
    }

    /// Load an image-classification TensorFlow checkpoint as an OpenVINO
    /// IR. `mean_values` and `scale` must parse as floats.
    #[allow(clippy::too_many_arguments)]
    pub fn load_tf_image_classification_as_openvino(
        &self,
        model_path: &str,
        model_type: &str,
        checkpoint_path: &str,
        input_shape: &[i64],
        reverse_input_channels: bool,
        mean_values: &[String],
        scale: &str,
    ) -> ModelResult<()> {
        self.bind(LoadRequest::tf_image_classification_as_openvino(
            model_path,
            model_type,
            checkpoint_path,
            input_shape,
            reverse_input_channels,
            mean_values,
            scale,
        )?)
    }

    /// Load a TensorFlow checkpoint as a calibrated int8 OpenVINO IR.
    pub fn load_tf_as_calibrated_openvino(
        &self,
        model_path: &str,
        options: CalibrationOptions,
    ) -> ModelResult<()> {
        self.bind(LoadRequest::tf_as_calibrated_openvino(model_path, &options)?)
    }

    /// Perform the one `Unloaded -> Loaded` transition under the state
    /// lock. A gateway failure leaves the handle unloaded.
    fn bind(&self, request: LoadRequest) -> ModelResult<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bound) = state.as_ref() {
            return Err(ModelError::AlreadyLoaded(bound.kind()));
        }

        let (command, args) = encode::load_call(self.instance, &request);
        self.gateway.invoke(command, &args)?;

        log::info!("{}: loaded {} model", self.instance, request.kind());
        *state = Some(request);
        Ok(())
    }

    // ─── Inference ──────────────────────────────────────────────────────

    /// Run inference. Accepts a single tensor or an ordered sequence of
    /// tensors; the output mirrors the input shape.
    ///
    /// Blocks while `concurrency_limit` predict calls are already in
    /// flight. A failed call leaves the loaded state and the admission
    /// accounting unchanged.
    pub fn predict(&self, input: impl Into<PredictInput>) -> ModelResult<PredictOutput> {
        let input = input.into();
        if !self.is_loaded() {
            return Err(ModelError::NotLoaded);
        }

        let _permit = self.gate.acquire();
        let was_batch = matches!(input, PredictInput::Batch(_));
        let (command, args) = encode::predict_call(self.instance, &input);
        let raw = self.gateway.invoke(command, &args)?;
        decode_output(&raw, was_batch)
    }

    // ─── Introspection ──────────────────────────────────────────────────

    /// The backend this handle is bound to, if any.
    pub fn backend(&self) -> Option<BackendKind> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(LoadRequest::kind)
    }

    pub fn is_loaded(&self) -> bool {
        self.backend().is_some()
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }
}

impl Drop for ModelHandle {
    /// Release the engine instance. Exactly one release per created
    /// instance; a fault here is logged and swallowed since Drop cannot
    /// propagate it.
    fn drop(&mut self) {
        let (command, args) = encode::release_call(self.instance);
        if let Err(err) = self.gateway.invoke(command, &args) {
            log::warn!("failed to release {}: {err}", self.instance);
        }
    }
}
