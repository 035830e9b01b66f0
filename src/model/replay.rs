// 该文件是 Kuangjing （框景） 项目的一部分。
// src/model/replay.rs - 回放录制的检测结果
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{convert::Infallible, path::PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  config::DetectionConfig,
  frame::TensorImage,
  geometry::TensorSpace,
  model::{ExecutorBuilder, ModelExecutor, Recognition},
};

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("结果文件解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 从 JSON 文件读取张量坐标下的检测结果
///
/// 文件内容为 `Recognition` 数组，坐标以模型输入张量为准。
#[derive(Debug, Clone)]
pub struct ReplayBuilder {
  path: PathBuf,
}

impl FromUrlWithScheme for ReplayBuilder {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayBuilder {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    Ok(ReplayBuilder {
      path: PathBuf::from(url.path()),
    })
  }
}

impl ReplayBuilder {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl ExecutorBuilder<DetectionConfig> for ReplayBuilder {
  type Executor = ReplayDetector;
  type Error = ReplayError;

  fn build(&self, params: &DetectionConfig) -> Result<Self::Executor, Self::Error> {
    info!(
      "加载回放结果: {} (代替模型 {}, 输入 {}x{})",
      self.path.display(),
      params.model_file,
      params.input_size,
      params.input_size
    );
    let data = std::fs::read(&self.path)?;
    let recognitions: Vec<Recognition<TensorSpace>> = serde_json::from_slice(&data)?;
    debug!("回放结果数量: {}", recognitions.len());
    Ok(ReplayDetector { recognitions })
  }
}

/// 每次推理都返回同一组结果
#[derive(Debug, Clone)]
pub struct ReplayDetector {
  recognitions: Vec<Recognition<TensorSpace>>,
}

impl ReplayDetector {
  pub fn new(recognitions: Vec<Recognition<TensorSpace>>) -> Self {
    Self { recognitions }
  }
}

impl ModelExecutor for ReplayDetector {
  type Input = TensorImage;
  type Output = Vec<Recognition<TensorSpace>>;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("回放推理, 输入尺寸 {}", input.size());
    Ok(self.recognitions.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn builds_from_recorded_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"[{{"id": "0", "label": "car", "confidence": 0.8,
           "location": {{"left": 10, "top": 20, "right": 30, "bottom": 40}}}},
          {{"id": "1", "label": "dog", "confidence": 0.3}}]"#
    )
    .unwrap();

    let url = Url::parse(&format!("replay://{}", file.path().display())).unwrap();
    let builder = ReplayBuilder::from_url(&url).unwrap();
    let detector = builder.build(&DetectionConfig::default()).unwrap();

    let tensor = TensorImage::from(image::RgbImage::new(4, 4));
    let results = detector.infer(&tensor).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].label, "car");
    assert_eq!(results[0].location.unwrap().to_array(), [10.0, 20.0, 30.0, 40.0]);
    assert!(results[1].location.is_none());
  }

  #[test]
  fn missing_file_is_an_error() {
    let builder = ReplayBuilder::new("/definitely/not/here.json");
    assert!(matches!(
      builder.build(&DetectionConfig::default()),
      Err(ReplayError::IoError(_))
    ));
  }
}
