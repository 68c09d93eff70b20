//! 선택적 패턴 스코어러.
//!
//! 결정적 규칙 카탈로그가 아무 패턴도 찾지 못했을 때만 참조되는 보조 분류기입니다.
//! 인터페이스는 `features → (label, confidence)` 하나로 고정되어 있어
//! 규칙 카탈로그를 건드리지 않고 교체하거나 생략할 수 있습니다.
//!
//! ONNX 모델 기반 구현(`OnnxPatternScorer`)은 `ml` feature가 필요합니다.

pub mod error;
#[cfg(feature = "ml")]
pub mod onnx;
pub mod scorer;

pub use error::{MlError, MlResult};
#[cfg(feature = "ml")]
pub use onnx::{OnnxPatternScorer, OnnxScorerConfig};
pub use scorer::{FixedScorer, PatternFeatures, PatternScorer, ScoredPattern, FEATURE_LEN};
