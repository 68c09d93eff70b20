//! 패턴 스코어러 에러 타입.

use thiserror::Error;

/// 스코어러에서 발생할 수 있는 에러.
#[derive(Debug, Error)]
pub enum MlError {
    /// 모델 로드 실패
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// 추론 실패
    #[error("Inference error: {0}")]
    Inference(String),

    /// 입력 feature 크기/값 오류
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 모델이 알 수 없는 레이블을 반환
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// ONNX Runtime 에러
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(String),
}

/// 스코어러 Result 타입.
pub type MlResult<T> = Result<T, MlError>;

impl MlError {
    /// 모델을 다시 로드해야 하는 에러인지 확인합니다.
    pub fn requires_reload(&self) -> bool {
        matches!(self, MlError::ModelLoad(_) | MlError::OnnxRuntime(_))
    }
}

#[cfg(feature = "ml")]
impl From<ort::Error> for MlError {
    fn from(err: ort::Error) -> Self {
        MlError::OnnxRuntime(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MlError::UnknownLabel("cup_and_handle".to_string());
        assert_eq!(err.to_string(), "Unknown label: cup_and_handle");
    }

    #[test]
    fn test_requires_reload() {
        assert!(MlError::ModelLoad("missing".into()).requires_reload());
        assert!(!MlError::InvalidInput("len".into()).requires_reload());
    }
}
