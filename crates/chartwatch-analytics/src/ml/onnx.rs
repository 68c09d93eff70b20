//! ONNX 모델 기반 패턴 스코어러.
//!
//! 모델 계약:
//! - 입력 `input`: `[1, FEATURE_LEN]` float32
//! - 출력: `[1, 24]` float32. 앞 23개는 카탈로그 순서의 패턴 확률, 마지막은 "패턴 없음"
//!
//! 출력 합이 1에서 벗어나면 softmax를 적용합니다.

use chartwatch_core::ChartPatternKind;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

use super::{MlError, MlResult, PatternFeatures, PatternScorer, ScoredPattern, FEATURE_LEN};

/// 출력 클래스 수 (카탈로그 + 없음).
const OUTPUT_LEN: usize = ChartPatternKind::CATALOGUE.len() + 1;

/// ONNX 스코어러 설정.
#[derive(Debug, Clone)]
pub struct OnnxScorerConfig {
    pub model_path: PathBuf,
    /// 이 값 미만의 확률은 "판단 없음"
    pub min_confidence: f32,
    pub model_name: String,
}

impl Default for OnnxScorerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/chart_pattern.onnx"),
            min_confidence: 0.6,
            model_name: "chart_pattern".to_string(),
        }
    }
}

impl OnnxScorerConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold;
        self
    }
}

/// ONNX 패턴 스코어러.
///
/// 세션 실행에 가변 참조가 필요하므로 `Mutex`로 감쌉니다.
pub struct OnnxPatternScorer {
    session: Mutex<Session>,
    config: OnnxScorerConfig,
}

impl OnnxPatternScorer {
    pub fn load(config: OnnxScorerConfig) -> MlResult<Self> {
        let path = &config.model_path;
        if !path.exists() {
            return Err(MlError::ModelLoad(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        info!(path = %path.display(), "Loading ONNX pattern model");

        let session = Session::builder()
            .map_err(|e| MlError::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MlError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| MlError::ModelLoad(format!("Failed to load model: {}", e)))?;

        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    fn infer(&self, features: &PatternFeatures) -> MlResult<Vec<f32>> {
        let input = ort::value::Tensor::from_array((
            [1i64, FEATURE_LEN as i64],
            features.as_slice().to_vec().into_boxed_slice(),
        ))
        .map_err(|e| MlError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MlError::Inference("session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs!["input" => input])
            .map_err(|e| MlError::Inference(format!("Inference failed: {}", e)))?;

        let output_name = outputs
            .iter()
            .next()
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| MlError::Inference("No output tensor found".to_string()))?;
        let output = outputs
            .get(&output_name)
            .ok_or_else(|| MlError::Inference("Failed to get output by name".to_string()))?;
        let (_, slice) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MlError::Inference(format!("Failed to extract output tensor: {}", e)))?;

        if slice.len() < OUTPUT_LEN {
            return Err(MlError::Inference(format!(
                "Expected {} output values, got {}",
                OUTPUT_LEN,
                slice.len()
            )));
        }
        Ok(slice[..OUTPUT_LEN].to_vec())
    }
}

/// 합이 1이 아니면 softmax.
fn normalize(mut probs: Vec<f32>) -> Vec<f32> {
    let sum: f32 = probs.iter().sum();
    if (sum - 1.0).abs() > 0.01 {
        let max = probs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        for p in probs.iter_mut() {
            *p = (*p - max).exp();
        }
        let total: f32 = probs.iter().sum();
        for p in probs.iter_mut() {
            *p /= total;
        }
    }
    probs
}

impl PatternScorer for OnnxPatternScorer {
    fn score(&self, features: &PatternFeatures) -> MlResult<Option<ScoredPattern>> {
        let probs = normalize(self.infer(features)?);

        let Some((best, confidence)) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            return Ok(None);
        };

        debug!(class = best, confidence, model = %self.config.model_name, "pattern scored");

        if best >= ChartPatternKind::CATALOGUE.len() || confidence < self.config.min_confidence {
            return Ok(None);
        }
        Ok(Some(ScoredPattern {
            kind: ChartPatternKind::CATALOGUE[best],
            confidence: f64::from(confidence),
        }))
    }

    fn name(&self) -> &str {
        &self.config.model_name
    }
}
