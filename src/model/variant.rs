// 该文件是 Kuangjing （框景） 项目的一部分。
// src/model/variant.rs - 分类模型变体
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{fmt, str::FromStr};

use thiserror::Error;

const CLASSIFIER_INPUT_SIZE: u32 = 224;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
  Quantized,
  Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
  MobileNet,
  EfficientNet,
}

/// 分类模型：精度 × 网络结构
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelVariant {
  pub precision: Precision,
  pub architecture: Architecture,
}

impl Default for ModelVariant {
  fn default() -> Self {
    Self::new(Precision::Quantized, Architecture::MobileNet)
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知的模型变体: {0}")]
pub struct ModelVariantParseError(pub String);

impl ModelVariant {
  pub const ALL: [ModelVariant; 4] = [
    ModelVariant::new(Precision::Quantized, Architecture::MobileNet),
    ModelVariant::new(Precision::Float, Architecture::MobileNet),
    ModelVariant::new(Precision::Quantized, Architecture::EfficientNet),
    ModelVariant::new(Precision::Float, Architecture::EfficientNet),
  ];

  pub const fn new(precision: Precision, architecture: Architecture) -> Self {
    Self {
      precision,
      architecture,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match (self.precision, self.architecture) {
      (Precision::Quantized, Architecture::MobileNet) => "QUANTIZED_MOBILENET",
      (Precision::Float, Architecture::MobileNet) => "FLOAT_MOBILENET",
      (Precision::Quantized, Architecture::EfficientNet) => "QUANTIZED_EFFICIENTNET",
      (Precision::Float, Architecture::EfficientNet) => "FLOAT_EFFICIENTNET",
    }
  }

  /// 在配置加载时确定模型文件、输入尺寸与归一化参数
  pub fn profile(&self) -> ModelProfile {
    let (model_file, label_file) = match (self.precision, self.architecture) {
      (Precision::Quantized, Architecture::MobileNet) => {
        ("mobilenet_v1_1.0_224_quant.tflite", "labels.txt")
      }
      (Precision::Float, Architecture::MobileNet) => ("mobilenet_v1_1.0_224.tflite", "labels.txt"),
      (Precision::Quantized, Architecture::EfficientNet) => {
        ("efficientnet-lite0-int8.tflite", "labels_without_background.txt")
      }
      (Precision::Float, Architecture::EfficientNet) => {
        ("efficientnet-lite0-fp32.tflite", "labels_without_background.txt")
      }
    };

    // 量化模型直接接收 uint8 像素
    let (mean, std) = match (self.precision, self.architecture) {
      (Precision::Quantized, _) => (0.0, 1.0),
      (Precision::Float, Architecture::MobileNet) => (127.5, 127.5),
      (Precision::Float, Architecture::EfficientNet) => (127.0, 128.0),
    };

    ModelProfile {
      variant: *self,
      model_file,
      label_file,
      input_size: CLASSIFIER_INPUT_SIZE,
      mean,
      std,
    }
  }
}

impl fmt::Display for ModelVariant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ModelVariant {
  type Err = ModelVariantParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_ascii_uppercase();
    ModelVariant::ALL
      .into_iter()
      .find(|v| v.as_str() == normalized)
      .ok_or_else(|| ModelVariantParseError(s.to_string()))
  }
}

/// 模型变体解析后的具体参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelProfile {
  pub variant: ModelVariant,
  pub model_file: &'static str,
  pub label_file: &'static str,
  pub input_size: u32,
  pub mean: f32,
  pub std: f32,
}

impl ModelProfile {
  pub fn is_quantized(&self) -> bool {
    self.variant.precision == Precision::Quantized
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn settings_strings_round_trip() {
    for variant in ModelVariant::ALL {
      let parsed: ModelVariant = variant.to_string().parse().unwrap();
      assert_eq!(parsed, variant);
    }
    assert_eq!(
      "float_efficientnet".parse::<ModelVariant>().unwrap(),
      ModelVariant::new(Precision::Float, Architecture::EfficientNet)
    );
    assert!("FLOAT_RESNET".parse::<ModelVariant>().is_err());
  }

  #[test]
  fn profile_resolves_normalization() {
    let float = ModelVariant::new(Precision::Float, Architecture::MobileNet).profile();
    assert_eq!((float.mean, float.std), (127.5, 127.5));
    assert!(!float.is_quantized());

    let quant = ModelVariant::default().profile();
    assert!(quant.is_quantized());
    assert_eq!(quant.input_size, 224);
    assert_eq!(quant.model_file, "mobilenet_v1_1.0_224_quant.tflite");
  }
}
