// 该文件是 Kuangjing （框景） 项目的一部分。
// src/config.rs - 分析器配置
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::str::FromStr;

use image::Rgb;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, geometry::FrameSize, model::ModelVariant};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{found}'")]
  SchemeMismatch { expected: &'static str, found: String },
  #[error("参数 '{key}' 的取值无效: {value}")]
  InvalidValue { key: String, value: String },
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
  value.parse().map_err(|_| ConfigError::InvalidValue {
    key: key.to_string(),
    value: value.to_string(),
  })
}

fn check_scheme<T: FromUrlWithScheme>(url: &Url) -> Result<(), ConfigError> {
  if url.scheme() != T::SCHEME {
    return Err(ConfigError::SchemeMismatch {
      expected: T::SCHEME,
      found: url.scheme().to_string(),
    });
  }
  Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value {
    "" | "1" | "true" | "yes" => Ok(true),
    "0" | "false" | "no" => Ok(false),
    _ => Err(ConfigError::InvalidValue {
      key: key.to_string(),
      value: value.to_string(),
    }),
  }
}

fn require_nonzero<T: PartialEq + Default + ToString>(key: &str, value: T) -> Result<T, ConfigError> {
  if value == T::default() {
    return Err(ConfigError::InvalidValue {
      key: key.to_string(),
      value: value.to_string(),
    });
  }
  Ok(value)
}

fn require_finite(key: &str, value: f32) -> Result<f32, ConfigError> {
  if !value.is_finite() {
    return Err(ConfigError::InvalidValue {
      key: key.to_string(),
      value: value.to_string(),
    });
  }
  Ok(value)
}

/// 目标检测分析器配置
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
  pub model_file: String,
  pub labels_file: String,
  pub is_quantized: bool,
  /// 模型输入边长
  pub input_size: u32,
  /// 预缩放目标尺寸
  pub frame_size: FrameSize,
  pub maintain_aspect: bool,
  pub min_confidence: f32,
}

impl Default for DetectionConfig {
  fn default() -> Self {
    Self {
      model_file: "custom-yolov4-tiny-detector_best.tflite".to_string(),
      labels_file: "labelmap.txt".to_string(),
      is_quantized: false,
      input_size: 416,
      frame_size: FrameSize::new(640, 480),
      maintain_aspect: false,
      min_confidence: 0.1,
    }
  }
}

impl FromUrlWithScheme for DetectionConfig {
  const SCHEME: &'static str = "detection";
}

impl FromUrl for DetectionConfig {
  type Error = ConfigError;

  /// `detection:///model.tflite?input_size=416&frame_width=640&frame_height=480&min_confidence=0.1`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme::<Self>(url)?;

    let mut config = DetectionConfig::default();
    if !url.path().is_empty() && url.path() != "/" {
      config.model_file = url.path().to_string();
    }

    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "labels" => config.labels_file = v.to_string(),
        "quantized" => config.is_quantized = parse_bool(&k, &v)?,
        "input_size" => config.input_size = parse_value(&k, &v)?,
        "frame_width" => config.frame_size.width = parse_value(&k, &v)?,
        "frame_height" => config.frame_size.height = parse_value(&k, &v)?,
        "maintain_aspect" => config.maintain_aspect = parse_bool(&k, &v)?,
        "min_confidence" => config.min_confidence = parse_value(&k, &v)?,
        other => warn!("忽略未知的检测配置参数: {}", other),
      }
    }

    require_nonzero("input_size", config.input_size)?;
    require_nonzero("frame_width", config.frame_size.width)?;
    require_nonzero("frame_height", config.frame_size.height)?;
    require_finite("min_confidence", config.min_confidence)?;
    Ok(config)
  }
}

/// 图像分类分析器配置
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationConfig {
  pub model: ModelVariant,
  pub min_confidence: f32,
  pub max_results: usize,
}

impl Default for ClassificationConfig {
  fn default() -> Self {
    Self {
      model: ModelVariant::default(),
      min_confidence: 0.1,
      max_results: 3,
    }
  }
}

impl FromUrlWithScheme for ClassificationConfig {
  const SCHEME: &'static str = "classification";
}

impl FromUrl for ClassificationConfig {
  type Error = ConfigError;

  /// `classification://?model=FLOAT_MOBILENET&threshold=0.1&top_k=3`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme::<Self>(url)?;

    let mut config = ClassificationConfig::default();
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "model" => config.model = parse_value(&k, &v)?,
        "threshold" => config.min_confidence = parse_value(&k, &v)?,
        "top_k" => config.max_results = parse_value(&k, &v)?,
        other => warn!("忽略未知的分类配置参数: {}", other),
      }
    }

    require_nonzero("top_k", config.max_results)?;
    require_finite("threshold", config.min_confidence)?;
    Ok(config)
  }
}

/// 风格迁移分析器配置
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTransferConfig {
  /// 内容图边长
  pub content_size: u32,
  /// 初始风格名称，选择风格后以分析器中的值为准
  pub style: Option<String>,
  pub padding: Rgb<u8>,
}

impl Default for StyleTransferConfig {
  fn default() -> Self {
    Self {
      content_size: 384,
      style: None,
      padding: Rgb([0, 0, 0]),
    }
  }
}

impl FromUrlWithScheme for StyleTransferConfig {
  const SCHEME: &'static str = "style";
}

impl FromUrl for StyleTransferConfig {
  type Error = ConfigError;

  /// `style://?size=384&style=starry_night.jpg`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme::<Self>(url)?;

    let mut config = StyleTransferConfig::default();
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "size" => config.content_size = parse_value(&k, &v)?,
        "style" => config.style = Some(v.to_string()),
        other => warn!("忽略未知的风格迁移配置参数: {}", other),
      }
    }

    require_nonzero("size", config.content_size)?;
    Ok(config)
  }
}
