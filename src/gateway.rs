//! The engine call boundary.
//!
//! Everything the crate knows about the external execution engine lives
//! here: the [`EngineTransport`] seam, the [`EngineGateway`] relay, and the
//! command-name/ordered-argument encoding of every request that crosses the
//! boundary. The gateway owns no state and performs no validation of its
//! own; by contract every argument arriving here is already well-formed.

use crate::backend::{LoadRequest, Precision, TfOpenVinoRequest};
use crate::error::{ModelError, ModelResult};
use crate::tensor::PredictInput;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Opaque reference to a model instance inside the engine's instance
/// table. Issued by the engine's `create` command; never dereferenced
/// locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineRef(pub u64);

impl fmt::Display for EngineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// A fault reported by the engine or the transport reaching it.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineFault {
    /// Diagnostic text from the engine, carried verbatim.
    pub message: String,
}

impl EngineFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The opaque remote-call boundary to the execution engine.
///
/// Implementations dispatch one named command with an ordered argument
/// list and return the engine's raw result or fault. Must be `Send + Sync`:
/// predict calls reach the transport concurrently up to the handle's
/// concurrency limit.
pub trait EngineTransport: Send + Sync {
    fn call(&self, command: &str, args: &[Value]) -> Result<Value, EngineFault>;
}

/// Stateless relay between validated requests and the engine transport.
///
/// Dispatches a command and normalizes any fault into
/// [`ModelError::Engine`] with the engine's diagnostic text. Zero retries:
/// every fault is terminal for the call that hit it.
#[derive(Clone)]
pub struct EngineGateway {
    transport: Arc<dyn EngineTransport>,
}

impl EngineGateway {
    pub fn new(transport: Arc<dyn EngineTransport>) -> Self {
        Self { transport }
    }

    /// Dispatch one command to the engine.
    pub fn invoke(&self, command: &str, args: &[Value]) -> ModelResult<Value> {
        log::debug!("engine call: {command} ({} args)", args.len());
        self.transport.call(command, args).map_err(|fault| {
            log::debug!("engine fault on {command}: {fault}");
            ModelError::Engine(fault.message)
        })
    }
}

/// Command names and ordered-argument encodings.
///
/// The instance reference always travels as the first argument. Argument
/// order within each command is part of the engine's call convention and
/// is pinned by the tests below.
pub mod encode {
    use super::*;
    use serde_json::json;

    pub const CREATE: &str = "create";
    pub const RELEASE: &str = "release";
    pub const PREDICT: &str = "predict";

    /// Instance creation: concurrency limit and precision tag.
    pub fn create_call(concurrency_limit: usize, precision: Precision) -> (&'static str, Vec<Value>) {
        (CREATE, vec![json!(concurrency_limit), json!(precision.as_str())])
    }

    /// Instance release.
    pub fn release_call(instance: EngineRef) -> (&'static str, Vec<Value>) {
        (RELEASE, vec![json!(instance.0)])
    }

    /// One load command per [`LoadRequest`] variant.
    pub fn load_call(instance: EngineRef, request: &LoadRequest) -> (&'static str, Vec<Value>) {
        let id = json!(instance.0);
        match request {
            LoadRequest::Native {
                model_path,
                weight_path,
            } => ("load", vec![id, json!(model_path), json!(weight_path)]),
            LoadRequest::Caffe {
                model_path,
                weight_path,
            } => ("loadCaffe", vec![id, json!(model_path), json!(weight_path)]),
            LoadRequest::OpenVino {
                model_path,
                weight_path,
            } => (
                "loadOpenVINO",
                vec![id, json!(model_path), json!(weight_path)],
            ),
            LoadRequest::OpenVinoInt8 {
                model_path,
                weight_path,
                batch_size,
            } => (
                "loadOpenVINOInt8",
                vec![id, json!(model_path), json!(weight_path), json!(batch_size)],
            ),
            LoadRequest::TensorFlow {
                model_path,
                intra_op_threads,
                inter_op_threads,
                use_per_session_threads,
            } => (
                "loadTensorFlow",
                vec![
                    id,
                    json!(model_path),
                    json!(intra_op_threads),
                    json!(inter_op_threads),
                    json!(use_per_session_threads),
                ],
            ),
            LoadRequest::TfAsOpenVino(inner) => {
                ("loadOpenVINOFromTensorFlow", tf_openvino_args(id, inner))
            }
            LoadRequest::TfAsCalibratedOpenVino {
                model_path,
                model_type,
                checkpoint_path,
                input_shape,
                reverse_input_channels,
                mean_values,
                scale,
                network,
                validation_file_path,
                subset,
                opencv_lib_path,
            } => (
                "loadOpenVINOFromTensorFlowCalibrated",
                vec![
                    id,
                    json!(model_path),
                    json!(model_type),
                    json!(checkpoint_path),
                    json!(input_shape),
                    json!(reverse_input_channels),
                    json!(mean_values),
                    json!(scale),
                    json!(network.as_str()),
                    json!(validation_file_path),
                    json!(subset),
                    json!(opencv_lib_path),
                ],
            ),
        }
    }

    fn tf_openvino_args(id: Value, request: &TfOpenVinoRequest) -> Vec<Value> {
        match request {
            TfOpenVinoRequest::ByModelType {
                model_path,
                model_type,
                pipeline_config_path: Some(pipeline),
            } => vec![
                id,
                json!(model_path),
                json!(model_type),
                json!(pipeline),
                Value::Null,
            ],
            TfOpenVinoRequest::ByModelType {
                model_path,
                model_type,
                pipeline_config_path: None,
            } => vec![id, json!(model_path), json!(model_type)],
            TfOpenVinoRequest::ByPipeline {
                model_path,
                pipeline_config_path,
                extensions_config_path,
            } => vec![
                id,
                json!(model_path),
                json!(pipeline_config_path),
                json!(extensions_config_path),
            ],
            TfOpenVinoRequest::ObjectDetection {
                model_path,
                model_type,
                pipeline_config_path,
                extensions_config_path,
            } => vec![
                id,
                json!(model_path),
                json!(model_type),
                json!(pipeline_config_path),
                json!(extensions_config_path),
            ],
            TfOpenVinoRequest::ImageClassification {
                model_path,
                model_type,
                checkpoint_path,
                input_shape,
                reverse_input_channels,
                mean_values,
                scale,
            } => vec![
                id,
                json!(model_path),
                json!(model_type),
                json!(checkpoint_path),
                json!(input_shape),
                json!(reverse_input_channels),
                json!(mean_values),
                json!(scale),
            ],
        }
    }

    /// Predict: encoded tensor list plus the sequence flag.
    pub fn predict_call(instance: EngineRef, input: &PredictInput) -> (&'static str, Vec<Value>) {
        let (tensors, is_batch) = crate::tensor::encode_input(input);
        (PREDICT, vec![json!(instance.0), tensors, json!(is_batch)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NetworkKind, TfLoadOptions};
    use serde_json::json;

    #[test]
    fn test_fault_normalization() {
        struct Failing;
        impl EngineTransport for Failing {
            fn call(&self, _command: &str, _args: &[Value]) -> Result<Value, EngineFault> {
                Err(EngineFault::new("instance table full"))
            }
        }

        let gateway = EngineGateway::new(Arc::new(Failing));
        let err = gateway.invoke("create", &[]).unwrap_err();
        assert_eq!(err, ModelError::Engine("instance table full".to_string()));
    }

    #[test]
    fn test_create_and_release_encoding() {
        let (command, args) = encode::create_call(4, Precision::Double);
        assert_eq!(command, "create");
        assert_eq!(args, vec![json!(4), json!("double")]);

        let (_, args) = encode::create_call(1, Precision::Single);
        assert_eq!(args, vec![json!(1), json!("float")]);

        let (command, args) = encode::release_call(EngineRef(7));
        assert_eq!(command, "release");
        assert_eq!(args, vec![json!(7)]);
    }

    #[test]
    fn test_load_command_names() {
        let id = EngineRef(7);
        let cases = [
            (LoadRequest::native("/m/model", None).unwrap(), "load"),
            (
                LoadRequest::caffe("/m/deploy.prototxt", "/m/w.caffemodel").unwrap(),
                "loadCaffe",
            ),
            (
                LoadRequest::openvino("/m/model.xml", "/m/model.bin").unwrap(),
                "loadOpenVINO",
            ),
            (
                LoadRequest::openvino_int8("/m/model.xml", "/m/model.bin", 4).unwrap(),
                "loadOpenVINOInt8",
            ),
            (
                LoadRequest::tensorflow("/m/frozen.pb", &TfLoadOptions::default()).unwrap(),
                "loadTensorFlow",
            ),
        ];
        for (request, expected) in cases {
            let (command, args) = encode::load_call(id, &request);
            assert_eq!(command, expected);
            assert_eq!(args[0], json!(7));
        }
    }

    #[test]
    fn test_alias_backends_encode_identically() {
        let id = EngineRef(1);
        let long = LoadRequest::tensorflow("/m/frozen.pb", &TfLoadOptions::default()).unwrap();
        let short =
            LoadRequest::tensorflow("/m/frozen.pb", &TfLoadOptions::with_backend("TF")).unwrap();
        assert_eq!(encode::load_call(id, &long), encode::load_call(id, &short));
    }

    #[test]
    fn test_tf_openvino_argument_shapes() {
        let id = EngineRef(3);

        let by_type = LoadRequest::tensorflow(
            "/m/frozen.pb",
            &TfLoadOptions::with_backend("ov").with_model_type("ssd_inception_v2"),
        )
        .unwrap();
        let (command, args) = encode::load_call(id, &by_type);
        assert_eq!(command, "loadOpenVINOFromTensorFlow");
        assert_eq!(args.len(), 3);

        let by_type_with_pipeline = LoadRequest::tensorflow(
            "/m/frozen.pb",
            &TfLoadOptions::with_backend("ov")
                .with_model_type("ssd_inception_v2")
                .with_pipeline_config("/m/pipeline.config"),
        )
        .unwrap();
        let (_, args) = encode::load_call(id, &by_type_with_pipeline);
        assert_eq!(args.len(), 5);
        assert_eq!(args[4], Value::Null);

        let by_pipeline = LoadRequest::tensorflow(
            "/m/frozen.pb",
            &TfLoadOptions::with_backend("ov")
                .with_pipeline_config("/m/pipeline.config")
                .with_extensions_config("/m/extensions.config"),
        )
        .unwrap();
        let (_, args) = encode::load_call(id, &by_pipeline);
        assert_eq!(args.len(), 4);
        assert_eq!(args[2], json!("/m/pipeline.config"));
    }

    #[test]
    fn test_calibrated_argument_order() {
        let request = LoadRequest::tf_as_calibrated_openvino(
            "/m/frozen.pb",
            &crate::backend::CalibrationOptions {
                model_type: "resnet_v1_50".to_string(),
                checkpoint_path: "/m/model.ckpt".to_string(),
                input_shape: vec![4, 224, 224, 3],
                reverse_input_channels: true,
                mean_values: vec!["123.68".to_string(), "116.78".to_string()],
                scale: "1.0".to_string(),
                network: NetworkKind::RawClassification,
                validation_file_path: "/data/val.txt".to_string(),
                subset: 32,
                opencv_lib_path: "/opt/opencv/lib".to_string(),
            },
        )
        .unwrap();

        let (command, args) = encode::load_call(EngineRef(9), &request);
        assert_eq!(command, "loadOpenVINOFromTensorFlowCalibrated");
        assert_eq!(args.len(), 12);
        assert_eq!(args[8], json!("RawC"));
        assert_eq!(args[10], json!(32));
    }

    #[test]
    fn test_predict_call_shape() {
        let tensor = ndarray::arr1(&[1.0_f32, 2.0]).into_dyn();
        let (command, args) =
            encode::predict_call(EngineRef(2), &PredictInput::Single(tensor.clone()));
        assert_eq!(command, "predict");
        assert_eq!(args.len(), 3);
        assert_eq!(args[2], json!(false));

        let (_, args) = encode::predict_call(EngineRef(2), &PredictInput::Batch(vec![tensor]));
        assert_eq!(args[2], json!(true));
    }
}
