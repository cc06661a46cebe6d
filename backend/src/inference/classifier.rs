use super::error::{InferenceError, LoadError};
use ndarray::Array4;
use shared::{NUM_CLASSES, Prediction};
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::*;

/// A loaded model that maps one preprocessed image to class scores.
///
/// Implementations are immutable after construction and shared across
/// requests, so they must be safe for concurrent reads.
pub trait Classifier: Send + Sync {
    /// NHWC shape the model was built for.
    fn input_shape(&self) -> [usize; 4];

    /// Raw model output for a tensor of shape `input_shape()`.
    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

/// Runs `classifier` on `input` and maps the output to a [`Prediction`].
pub fn predict(
    classifier: &dyn Classifier,
    input: &Array4<f32>,
    apply_softmax: bool,
) -> Result<Prediction, InferenceError> {
    let expected = classifier.input_shape();
    if input.shape() != expected.as_slice() {
        return Err(InferenceError::ShapeMismatch {
            expected,
            actual: input.shape().to_vec(),
        });
    }

    let mut output = classifier.forward(input)?;
    if apply_softmax {
        softmax(&mut output);
    }

    let actual = output.len();
    let probabilities: [f32; NUM_CLASSES] =
        output.try_into().map_err(|_| InferenceError::OutputMismatch {
            expected: NUM_CLASSES,
            actual,
        })?;
    Ok(Prediction::from_probabilities(probabilities))
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

/// Picks a runtime from the artifact's extension and loads it.
pub fn load_classifier(
    path: &Path,
    input_shape: [usize; 4],
) -> Result<Arc<dyn Classifier>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("onnx") => Ok(Arc::new(OnnxClassifier::load(path, input_shape)?)),
        #[cfg(feature = "torch")]
        Some("pt") | Some("pth") => Ok(Arc::new(torch::TorchClassifier::load(path, input_shape)?)),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// ONNX model executed with tract.
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: [usize; 4],
}

impl OnnxClassifier {
    pub fn load(path: &Path, input_shape: [usize; 4]) -> Result<Self, LoadError> {
        let backend = |e: TractError| LoadError::Backend(format!("{}: {:?}", path.display(), e));

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(backend)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), input_shape.to_vec()),
            )
            .map_err(backend)?
            .into_optimized()
            .map_err(backend)?
            .into_runnable()
            .map_err(backend)?;

        Ok(Self { plan, input_shape })
    }
}

impl Classifier for OnnxClassifier {
    fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let runtime = |e: TractError| InferenceError::Runtime(format!("{:?}", e));

        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_shape(input.shape(), &data).map_err(runtime)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(runtime)?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::Runtime("model returned no outputs".to_string()))?;
        let scores = output.to_array_view::<f32>().map_err(runtime)?;
        Ok(scores.iter().copied().collect())
    }
}

#[cfg(feature = "torch")]
mod torch {
    use super::{Classifier, InferenceError, LoadError};
    use ndarray::Array4;
    use std::path::Path;
    use std::sync::Mutex;
    use tch::{CModule, Device, Tensor, nn::ModuleT};

    /// TorchScript module executed with libtorch.
    pub struct TorchClassifier {
        module: Mutex<CModule>,
        device: Device,
        input_shape: [usize; 4],
    }

    impl TorchClassifier {
        pub fn load(path: &Path, input_shape: [usize; 4]) -> Result<Self, LoadError> {
            let device = Device::cuda_if_available();
            let module = CModule::load_on_device(path, device)
                .map_err(|e| LoadError::Backend(format!("{}: {}", path.display(), e)))?;
            Ok(Self {
                module: Mutex::new(module),
                device,
                input_shape,
            })
        }
    }

    impl Classifier for TorchClassifier {
        fn input_shape(&self) -> [usize; 4] {
            self.input_shape
        }

        fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            let data: Vec<f32> = input.iter().copied().collect();
            let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
            let tensor = Tensor::from_slice(&data).view(shape.as_slice()).to_device(self.device);

            let output = self
                .module
                .lock()
                .map_err(|_| InferenceError::Runtime("model lock poisoned".to_string()))?
                .forward_t(&tensor, false);

            let output_flat = output.to_kind(tch::Kind::Float).view([-1]);
            let num_elements = output_flat.size()[0] as usize;
            let mut output_vec = vec![0.0f32; num_elements];
            output_flat.copy_data(&mut output_vec, num_elements);
            Ok(output_vec)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed distribution and counts calls.
    pub(crate) struct FixedClassifier {
        pub output: Vec<f32>,
        pub calls: AtomicUsize,
    }

    impl FixedClassifier {
        pub(crate) fn new(output: Vec<f32>) -> Self {
            Self {
                output,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn input_shape(&self) -> [usize; 4] {
            [1, 350, 350, 3]
        }

        fn forward(&self, _input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    fn input() -> Array4<f32> {
        Array4::zeros((1, 350, 350, 3))
    }

    #[test]
    fn maps_distribution_to_prediction() {
        let classifier = FixedClassifier::new(vec![0.01, 0.02, 0.96, 0.01]);
        let prediction = predict(&classifier, &input(), false).unwrap();
        assert_eq!(prediction.predicted_class, shared::ClassLabel::Normal);
        assert_eq!(prediction.confidence_display(), "96.00%");
    }

    #[test]
    fn same_input_gives_same_prediction() {
        let classifier = FixedClassifier::new(vec![0.2, 0.5, 0.2, 0.1]);
        let first = predict(&classifier, &input(), false).unwrap();
        let second = predict(&classifier, &input(), false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn wrong_shape_is_rejected_before_running() {
        let classifier = FixedClassifier::new(vec![0.25; 4]);
        let err = predict(&classifier, &Array4::zeros((1, 224, 224, 3)), false).unwrap_err();
        assert!(matches!(err, InferenceError::ShapeMismatch { .. }));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wrong_output_length_is_rejected() {
        let classifier = FixedClassifier::new(vec![0.5, 0.5]);
        let err = predict(&classifier, &input(), false).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::OutputMismatch {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn softmax_turns_logits_into_distribution() {
        let classifier = FixedClassifier::new(vec![1.0, 2.0, 5.0, 0.5]);
        let prediction = predict(&classifier, &input(), true).unwrap();
        let total: f32 = prediction.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(prediction.predicted_class, shared::ClassLabel::Normal);
        assert!((0.0..=100.0).contains(&prediction.confidence));
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let err = load_classifier(Path::new("no/such/model.onnx"), [1, 350, 350, 3])
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let err = load_classifier(&path, [1, 350, 350, 3]).err().unwrap();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn corrupt_onnx_is_a_backend_error() {
        let path = std::env::temp_dir()
            .join(format!("lungscan-corrupt-{}.onnx", std::process::id()));
        std::fs::write(&path, b"definitely not protobuf").unwrap();
        let result = load_classifier(&path, [1, 350, 350, 3]);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result.err().unwrap(), LoadError::Backend(_)));
    }
}
