//! Backend tags and validated load-request payloads.
//!
//! Everything the engine needs to load a model is captured here as a
//! [`LoadRequest`] variant. Raw, partially-overlapping user parameters are
//! parsed into a closed variant *before* anything crosses the engine
//! boundary; an invalid combination never becomes a `LoadRequest` at all.
//! The [`crate::gateway`] module then encodes each variant into the engine's
//! ordered-argument call convention.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric precision the engine instance computes in. Fixed at handle
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    /// 32-bit floating point.
    Single,
    /// 64-bit floating point.
    Double,
}

impl Precision {
    /// Wire tag understood by the engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Single => "float",
            Precision::Double => "double",
        }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Single
    }
}

/// Closed tag set of supported model backends.
///
/// A handle binds to exactly one of these over its lifetime; the tag is
/// what [`crate::model::ModelHandle::backend`] reports after a successful
/// load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Native framework checkpoint (model file plus optional weights).
    NativeCheckpoint,
    /// Caffe prototxt + caffemodel pair.
    Caffe,
    /// TensorFlow frozen graph executed on the TensorFlow runtime.
    TensorFlow,
    /// OpenVINO IR (xml structure + bin weights).
    OpenVino,
    /// Calibrated int8 OpenVINO IR.
    OpenVinoInt8,
    /// TensorFlow model converted to an OpenVINO IR at load time.
    OpenVinoFromTensorFlow,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::NativeCheckpoint => "native",
            BackendKind::Caffe => "caffe",
            BackendKind::TensorFlow => "tensorflow",
            BackendKind::OpenVino => "openvino",
            BackendKind::OpenVinoInt8 => "openvino-int8",
            BackendKind::OpenVinoFromTensorFlow => "openvino-from-tensorflow",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purpose of a network being calibrated to int8.
///
/// Selects between full calibration and statistics-only collection, for
/// classification or object-detection networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkKind {
    Classification,
    ObjectDetection,
    RawClassification,
    RawObjectDetection,
}

impl NetworkKind {
    /// Wire tag understood by the engine's calibration tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Classification => "C",
            NetworkKind::ObjectDetection => "OD",
            NetworkKind::RawClassification => "RawC",
            NetworkKind::RawObjectDetection => "RawOD",
        }
    }
}

/// Which runtime executes a TensorFlow model loaded through
/// [`crate::model::ModelHandle::load_tf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TfBackend {
    TensorFlow,
    OpenVino,
}

impl TfBackend {
    /// Parse a user-supplied backend tag. Case-insensitive; accepts the
    /// short aliases `tf` and `ov`.
    pub(crate) fn parse(tag: &str) -> ModelResult<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "tensorflow" | "tf" => Ok(TfBackend::TensorFlow),
            "openvino" | "ov" => Ok(TfBackend::OpenVino),
            _ => Err(ModelError::unsupported_backend(tag)),
        }
    }
}

/// Shape of a TensorFlow-to-OpenVINO conversion load.
///
/// The engine's converter accepts several parameter sets for the same
/// operation; each supported set is pinned as its own variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TfOpenVinoRequest {
    /// Conversion driven by a known model type, with an optional pipeline
    /// configuration override.
    ByModelType {
        model_path: String,
        model_type: String,
        pipeline_config_path: Option<String>,
    },
    /// Conversion driven by explicit pipeline and extensions configuration
    /// files.
    ByPipeline {
        model_path: String,
        pipeline_config_path: String,
        extensions_config_path: String,
    },
    /// Object-detection conversion: model type plus both configuration
    /// files.
    ObjectDetection {
        model_path: String,
        model_type: String,
        pipeline_config_path: String,
        extensions_config_path: String,
    },
    /// Image-classification conversion from a checkpoint, with input
    /// preprocessing parameters.
    ImageClassification {
        model_path: String,
        model_type: String,
        checkpoint_path: String,
        input_shape: Vec<i64>,
        reverse_input_channels: bool,
        mean_values: Vec<f32>,
        scale: f32,
    },
}

/// A validated, backend-specific load payload.
///
/// Constructed only through the associated functions below, which perform
/// all parameter validation. Once one of these exists it is well-formed by
/// construction and ready for wire encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoadRequest {
    Native {
        model_path: String,
        weight_path: Option<String>,
    },
    Caffe {
        model_path: String,
        weight_path: String,
    },
    TensorFlow {
        model_path: String,
        intra_op_threads: u32,
        inter_op_threads: u32,
        use_per_session_threads: bool,
    },
    OpenVino {
        model_path: String,
        weight_path: String,
    },
    OpenVinoInt8 {
        model_path: String,
        weight_path: String,
        batch_size: u32,
    },
    TfAsOpenVino(TfOpenVinoRequest),
    TfAsCalibratedOpenVino {
        model_path: String,
        model_type: String,
        checkpoint_path: String,
        input_shape: Vec<i64>,
        reverse_input_channels: bool,
        mean_values: Vec<f32>,
        scale: f32,
        network: NetworkKind,
        validation_file_path: String,
        subset: i32,
        opencv_lib_path: String,
    },
}

/// Options for [`crate::model::ModelHandle::load_tf`].
///
/// The `backend` tag picks the branch; options that are irrelevant to the
/// chosen branch are silently ignored rather than rejected (the
/// TensorFlow branch never looks at `model_type` or the pipeline paths,
/// and the OpenVINO branch never looks at the threading knobs).
#[derive(Debug, Clone, PartialEq)]
pub struct TfLoadOptions {
    /// `"tensorflow"` (alias `"tf"`) or `"openvino"` (alias `"ov"`),
    /// case-insensitive.
    pub backend: String,
    /// TensorFlow branch only: intra-op parallelism threads.
    pub intra_op_threads: u32,
    /// TensorFlow branch only: inter-op parallelism threads.
    pub inter_op_threads: u32,
    /// TensorFlow branch only: whether to use per-session thread pools.
    pub use_per_session_threads: bool,
    /// OpenVINO branch only: known model type driving the conversion.
    pub model_type: Option<String>,
    /// OpenVINO branch only: pipeline configuration file.
    pub pipeline_config_path: Option<String>,
    /// OpenVINO branch only: extensions configuration file. Required
    /// together with `pipeline_config_path` when `model_type` is absent.
    pub extensions_config_path: Option<String>,
}

impl Default for TfLoadOptions {
    fn default() -> Self {
        Self {
            backend: "tensorflow".to_string(),
            intra_op_threads: 1,
            inter_op_threads: 1,
            use_per_session_threads: true,
            model_type: None,
            pipeline_config_path: None,
            extensions_config_path: None,
        }
    }
}

impl TfLoadOptions {
    /// Options targeting the given backend tag, other fields defaulted.
    pub fn with_backend(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Self::default()
        }
    }

    /// Set the TensorFlow threading parameters.
    pub fn with_threads(mut self, intra_op: u32, inter_op: u32, per_session: bool) -> Self {
        self.intra_op_threads = intra_op;
        self.inter_op_threads = inter_op;
        self.use_per_session_threads = per_session;
        self
    }

    /// Set the OpenVINO conversion model type.
    pub fn with_model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = Some(model_type.into());
        self
    }

    /// Set the OpenVINO pipeline configuration file.
    pub fn with_pipeline_config(mut self, path: impl Into<String>) -> Self {
        self.pipeline_config_path = Some(path.into());
        self
    }

    /// Set the OpenVINO extensions configuration file.
    pub fn with_extensions_config(mut self, path: impl Into<String>) -> Self {
        self.extensions_config_path = Some(path.into());
        self
    }
}

/// Options for [`crate::model::ModelHandle::load_tf_as_calibrated_openvino`].
///
/// `mean_values` and `scale` are accepted as strings and coerced to floats
/// during validation, so callers forwarding untyped configuration do not
/// have to pre-parse them.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOptions {
    /// Known model type driving the conversion.
    pub model_type: String,
    /// TensorFlow checkpoint file.
    pub checkpoint_path: String,
    /// Input shape fed to the network's input node(s).
    pub input_shape: Vec<i64>,
    /// Whether input channels must be reversed (RGB vs BGR).
    pub reverse_input_channels: bool,
    /// Per-channel mean subtraction values; must parse as floats.
    pub mean_values: Vec<String>,
    /// Scalar scale factor applied per channel; must parse as a float.
    pub scale: String,
    /// Purpose of the network being calibrated.
    pub network: NetworkKind,
    /// File listing the validation images used to calibrate.
    pub validation_file_path: String,
    /// Number of validation images in the calibration subset.
    pub subset: i32,
    /// Directory holding the OpenCV imaging libraries the calibration
    /// tool links against.
    pub opencv_lib_path: String,
}

impl LoadRequest {
    /// Native framework checkpoint, weights optional.
    pub fn native(model_path: &str, weight_path: Option<&str>) -> ModelResult<Self> {
        Ok(LoadRequest::Native {
            model_path: require_path("model_path", model_path)?,
            weight_path: match weight_path {
                Some(p) => Some(require_path("weight_path", p)?),
                None => None,
            },
        })
    }

    /// Caffe prototxt + caffemodel pair.
    pub fn caffe(model_path: &str, weight_path: &str) -> ModelResult<Self> {
        Ok(LoadRequest::Caffe {
            model_path: require_path("model_path", model_path)?,
            weight_path: require_path("weight_path", weight_path)?,
        })
    }

    /// OpenVINO IR (xml + bin).
    pub fn openvino(model_path: &str, weight_path: &str) -> ModelResult<Self> {
        Ok(LoadRequest::OpenVino {
            model_path: require_path("model_path", model_path)?,
            weight_path: require_path("weight_path", weight_path)?,
        })
    }

    /// Calibrated int8 OpenVINO IR with a fixed batch size.
    pub fn openvino_int8(model_path: &str, weight_path: &str, batch_size: u32) -> ModelResult<Self> {
        if batch_size == 0 {
            return Err(ModelError::config("batch_size must be at least 1"));
        }
        Ok(LoadRequest::OpenVinoInt8 {
            model_path: require_path("model_path", model_path)?,
            weight_path: require_path("weight_path", weight_path)?,
            batch_size,
        })
    }

    /// The TensorFlow dispatch: resolve the backend tag and build exactly
    /// one request for the chosen branch.
    pub fn tensorflow(model_path: &str, options: &TfLoadOptions) -> ModelResult<Self> {
        let model_path = require_path("model_path", model_path)?;
        match TfBackend::parse(&options.backend)? {
            TfBackend::TensorFlow => Ok(LoadRequest::TensorFlow {
                model_path,
                intra_op_threads: options.intra_op_threads,
                inter_op_threads: options.inter_op_threads,
                use_per_session_threads: options.use_per_session_threads,
            }),
            TfBackend::OpenVino => match &options.model_type {
                Some(model_type) => Ok(LoadRequest::TfAsOpenVino(
                    TfOpenVinoRequest::ByModelType {
                        model_path,
                        model_type: require_path("model_type", model_type)?,
                        pipeline_config_path: match &options.pipeline_config_path {
                            Some(p) => Some(require_path("pipeline_config_path", p)?),
                            None => None,
                        },
                    },
                )),
                None => {
                    match (&options.pipeline_config_path, &options.extensions_config_path) {
                        (Some(pipeline), Some(extensions)) => Ok(LoadRequest::TfAsOpenVino(
                            TfOpenVinoRequest::ByPipeline {
                                model_path,
                                pipeline_config_path: require_path(
                                    "pipeline_config_path",
                                    pipeline,
                                )?,
                                extensions_config_path: require_path(
                                    "extensions_config_path",
                                    extensions,
                                )?,
                            },
                        )),
                        _ => Err(ModelError::config(
                            "openvino backend requires either model_type, or both \
                             pipeline_config_path and extensions_config_path",
                        )),
                    }
                }
            },
        }
    }

    /// Object-detection TensorFlow model converted to an OpenVINO IR.
    pub fn tf_object_detection_as_openvino(
        model_path: &str,
        model_type: &str,
        pipeline_config_path: &str,
        extensions_config_path: &str,
    ) -> ModelResult<Self> {
        Ok(LoadRequest::TfAsOpenVino(TfOpenVinoRequest::ObjectDetection {
            model_path: require_path("model_path", model_path)?,
            model_type: require_path("model_type", model_type)?,
            pipeline_config_path: require_path("pipeline_config_path", pipeline_config_path)?,
            extensions_config_path: require_path(
                "extensions_config_path",
                extensions_config_path,
            )?,
        }))
    }

    /// Image-classification TensorFlow checkpoint converted to an OpenVINO
    /// IR. `mean_values` and `scale` are coerced to floats here.
    pub fn tf_image_classification_as_openvino(
        model_path: &str,
        model_type: &str,
        checkpoint_path: &str,
        input_shape: &[i64],
        reverse_input_channels: bool,
        mean_values: &[String],
        scale: &str,
    ) -> ModelResult<Self> {
        Ok(LoadRequest::TfAsOpenVino(TfOpenVinoRequest::ImageClassification {
            model_path: require_path("model_path", model_path)?,
            model_type: require_path("model_type", model_type)?,
            checkpoint_path: require_path("checkpoint_path", checkpoint_path)?,
            input_shape: input_shape.to_vec(),
            reverse_input_channels,
            mean_values: parse_floats("mean_values", mean_values)?,
            scale: parse_float("scale", scale)?,
        }))
    }

    /// TensorFlow checkpoint converted to a calibrated int8 OpenVINO IR.
    pub fn tf_as_calibrated_openvino(
        model_path: &str,
        options: &CalibrationOptions,
    ) -> ModelResult<Self> {
        Ok(LoadRequest::TfAsCalibratedOpenVino {
            model_path: require_path("model_path", model_path)?,
            model_type: require_path("model_type", &options.model_type)?,
            checkpoint_path: require_path("checkpoint_path", &options.checkpoint_path)?,
            input_shape: options.input_shape.clone(),
            reverse_input_channels: options.reverse_input_channels,
            mean_values: parse_floats("mean_values", &options.mean_values)?,
            scale: parse_float("scale", &options.scale)?,
            network: options.network,
            validation_file_path: require_path(
                "validation_file_path",
                &options.validation_file_path,
            )?,
            subset: options.subset,
            opencv_lib_path: require_path("opencv_lib_path", &options.opencv_lib_path)?,
        })
    }

    /// The backend tag this request binds the handle to on success.
    pub fn kind(&self) -> BackendKind {
        match self {
            LoadRequest::Native { .. } => BackendKind::NativeCheckpoint,
            LoadRequest::Caffe { .. } => BackendKind::Caffe,
            LoadRequest::TensorFlow { .. } => BackendKind::TensorFlow,
            LoadRequest::OpenVino { .. } => BackendKind::OpenVino,
            LoadRequest::OpenVinoInt8 { .. } => BackendKind::OpenVinoInt8,
            LoadRequest::TfAsOpenVino(_) | LoadRequest::TfAsCalibratedOpenVino { .. } => {
                BackendKind::OpenVinoFromTensorFlow
            }
        }
    }
}

fn require_path(name: &str, value: &str) -> ModelResult<String> {
    if value.trim().is_empty() {
        Err(ModelError::config(format!("{name} must not be empty")))
    } else {
        Ok(value.to_string())
    }
}

fn parse_float(name: &str, value: &str) -> ModelResult<f32> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| ModelError::config(format!("{name}: '{value}' is not a valid float")))
}

fn parse_floats(name: &str, values: &[String]) -> ModelResult<Vec<f32>> {
    values.iter().map(|v| parse_float(name, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_alias_insensitivity() {
        let opts_long = TfLoadOptions::default();
        let opts_short = TfLoadOptions::with_backend("TF");
        assert_eq!(
            LoadRequest::tensorflow("/m/frozen.pb", &opts_long).unwrap(),
            LoadRequest::tensorflow("/m/frozen.pb", &opts_short).unwrap()
        );

        let opts_ov = TfLoadOptions::with_backend("OpenVINO").with_model_type("ssd_inception_v2");
        let opts_ov_short = TfLoadOptions::with_backend("ov").with_model_type("ssd_inception_v2");
        assert_eq!(
            LoadRequest::tensorflow("/m/frozen.pb", &opts_ov).unwrap(),
            LoadRequest::tensorflow("/m/frozen.pb", &opts_ov_short).unwrap()
        );
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let opts = TfLoadOptions::with_backend("tflite");
        assert!(matches!(
            LoadRequest::tensorflow("/m/frozen.pb", &opts),
            Err(ModelError::UnsupportedBackend(_))
        ));
    }

    #[test]
    fn test_openvino_branch_requires_type_or_both_paths() {
        let bare = TfLoadOptions::with_backend("openvino");
        assert!(matches!(
            LoadRequest::tensorflow("/m/frozen.pb", &bare),
            Err(ModelError::Configuration(_))
        ));

        // Either config path alone is still invalid.
        let pipeline_only =
            TfLoadOptions::with_backend("openvino").with_pipeline_config("/m/pipeline.config");
        assert!(matches!(
            LoadRequest::tensorflow("/m/frozen.pb", &pipeline_only),
            Err(ModelError::Configuration(_))
        ));

        let both = TfLoadOptions::with_backend("openvino")
            .with_pipeline_config("/m/pipeline.config")
            .with_extensions_config("/m/extensions.config");
        assert!(matches!(
            LoadRequest::tensorflow("/m/frozen.pb", &both).unwrap(),
            LoadRequest::TfAsOpenVino(TfOpenVinoRequest::ByPipeline { .. })
        ));

        let type_only = TfLoadOptions::with_backend("openvino").with_model_type("faster_rcnn");
        assert!(matches!(
            LoadRequest::tensorflow("/m/frozen.pb", &type_only).unwrap(),
            LoadRequest::TfAsOpenVino(TfOpenVinoRequest::ByModelType {
                pipeline_config_path: None,
                ..
            })
        ));
    }

    #[test]
    fn test_tensorflow_branch_ignores_openvino_options() {
        let opts = TfLoadOptions::default()
            .with_model_type("faster_rcnn")
            .with_pipeline_config("/m/pipeline.config");
        let request = LoadRequest::tensorflow("/m/frozen.pb", &opts).unwrap();
        assert!(matches!(request, LoadRequest::TensorFlow { .. }));
    }

    #[test]
    fn test_empty_paths_rejected() {
        assert!(matches!(
            LoadRequest::caffe("", "/m/weights.caffemodel"),
            Err(ModelError::Configuration(_))
        ));
        assert!(matches!(
            LoadRequest::openvino("/m/model.xml", "  "),
            Err(ModelError::Configuration(_))
        ));
        assert!(matches!(
            LoadRequest::native("/m/model.ckpt", Some("")),
            Err(ModelError::Configuration(_))
        ));
    }

    #[test]
    fn test_int8_batch_size_positive() {
        assert!(matches!(
            LoadRequest::openvino_int8("/m/model.xml", "/m/model.bin", 0),
            Err(ModelError::Configuration(_))
        ));
        let request = LoadRequest::openvino_int8("/m/model.xml", "/m/model.bin", 4).unwrap();
        assert_eq!(request.kind(), BackendKind::OpenVinoInt8);
    }

    #[test]
    fn test_mean_value_coercion() {
        let ok = LoadRequest::tf_image_classification_as_openvino(
            "/m/frozen.pb",
            "resnet_v1_50",
            "/m/model.ckpt",
            &[1, 224, 224, 3],
            true,
            &["123.68".to_string(), "116.78".to_string(), "103.94".to_string()],
            "1.0",
        )
        .unwrap();
        match ok {
            LoadRequest::TfAsOpenVino(TfOpenVinoRequest::ImageClassification {
                mean_values,
                scale,
                ..
            }) => {
                assert_eq!(mean_values, vec![123.68, 116.78, 103.94]);
                assert_eq!(scale, 1.0);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        let err = LoadRequest::tf_image_classification_as_openvino(
            "/m/frozen.pb",
            "resnet_v1_50",
            "/m/model.ckpt",
            &[1, 224, 224, 3],
            true,
            &["0.1".to_string(), "abc".to_string()],
            "1.0",
        );
        assert!(matches!(err, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            LoadRequest::native("/m/model", None).unwrap().kind(),
            BackendKind::NativeCheckpoint
        );
        assert_eq!(
            LoadRequest::caffe("/m/deploy.prototxt", "/m/weights.caffemodel")
                .unwrap()
                .kind(),
            BackendKind::Caffe
        );
        let opts = TfLoadOptions::with_backend("ov").with_model_type("ssd");
        assert_eq!(
            LoadRequest::tensorflow("/m/frozen.pb", &opts).unwrap().kind(),
            BackendKind::OpenVinoFromTensorFlow
        );
    }

    #[test]
    fn test_network_kind_wire_tags() {
        assert_eq!(NetworkKind::Classification.as_str(), "C");
        assert_eq!(NetworkKind::ObjectDetection.as_str(), "OD");
        assert_eq!(NetworkKind::RawClassification.as_str(), "RawC");
        assert_eq!(NetworkKind::RawObjectDetection.as_str(), "RawOD");
    }
}
