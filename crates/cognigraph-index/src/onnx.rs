//! ONNX-based embedder using all-MiniLM-L6-v2.
//!
//! Loads a SentenceTransformers ONNX model and tokenizer to generate
//! 384-dimensional float32 embeddings. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;
    use std::sync::Arc;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{info, warn};

    use crate::embedder::EmbedderBackend;

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 512;

    /// all-MiniLM-L6-v2 output dimension.
    const MODEL_DIM: usize = 384;

    pub struct OnnxEmbedder {
        session: Arc<Mutex<Session>>,
        tokenizer: Tokenizer,
    }

    impl OnnxEmbedder {
        /// Load `model.onnx` and `tokenizer.json` from the given directory.
        pub fn load(model_dir: &Path) -> Result<Self, String> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(format!("model not found: {}", model_path.display()));
            }
            if !tokenizer_path.exists() {
                return Err(format!("tokenizer not found: {}", tokenizer_path.display()));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point at libonnxruntime.
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| format!("session builder failed: {}", e))?
                .with_intra_threads(2)
                .map_err(|e| format!("thread config failed: {}", e))?
                .commit_from_file(&model_path)
                .map_err(|e| format!("model load failed: {}", e))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| format!("tokenizer load failed: {}", e))?;

            info!("ONNX embedder loaded from {}", model_path.display());

            Ok(Self {
                session: Arc::new(Mutex::new(session)),
                tokenizer,
            })
        }

        fn infer(&self, text: &str) -> Option<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| warn!("tokenization failed: {}", e))
                .ok()?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let input_ids = &encoding.get_ids()[..seq_len];
            let attention_mask = &encoding.get_attention_mask()[..seq_len];

            let ids_data: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
            let mask_data: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();
            let type_ids_data = vec![0i64; seq_len];

            let ids = Tensor::from_array(([1usize, seq_len], ids_data))
                .map_err(|e| warn!("ids tensor failed: {}", e))
                .ok()?;
            let mask = Tensor::from_array(([1usize, seq_len], mask_data))
                .map_err(|e| warn!("mask tensor failed: {}", e))
                .ok()?;
            let type_ids = Tensor::from_array(([1usize, seq_len], type_ids_data))
                .map_err(|e| warn!("type_ids tensor failed: {}", e))
                .ok()?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids, mask, type_ids])
                .map_err(|e| warn!("inference failed: {}", e))
                .ok()?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| warn!("output extraction failed: {}", e))
                .ok()?;
            let shape: Vec<i64> = shape.iter().copied().collect();

            // [1, seq_len, dim] token embeddings need mean pooling over
            // the attention mask; [1, dim] is already pooled.
            match shape.len() {
                3 => {
                    let dim = shape[2] as usize;
                    let mask_sum: f32 = attention_mask.iter().map(|&m| m as f32).sum();
                    if mask_sum < 1e-9 {
                        return None;
                    }
                    let mut pooled = Array1::zeros(dim);
                    for (i, &m) in attention_mask.iter().enumerate() {
                        if m > 0 {
                            let offset = i * dim;
                            for d in 0..dim {
                                pooled[d] += data[offset + d];
                            }
                        }
                    }
                    Some(pooled / mask_sum)
                }
                2 => {
                    let dim = shape[1] as usize;
                    Some(Array1::from_vec(data[..dim].to_vec()))
                }
                _ => {
                    warn!("unexpected output shape: {:?}", shape);
                    None
                }
            }
        }
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Option<Array1<f32>> {
            self.infer(text)
        }

        fn dimension(&self) -> usize {
            MODEL_DIM
        }

        fn name(&self) -> &'static str {
            "onnx"
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
