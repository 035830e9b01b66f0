// 该文件是 Kuangjing （框景） 项目的一部分。
// src/dump.rs - 中间图像转储
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

use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

pub const PRE_SCALED_IMAGE_FILE: &str = "pre-scaled.png";
pub const CROPPED_IMAGE_FILE: &str = "cropped.png";
pub const STYLED_IMAGE_FILE: &str = "styled.png";

#[derive(Error, Debug)]
pub enum DumpError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 把预处理各阶段的图像写入目录，仅用于调试
#[derive(Debug, Clone)]
pub struct DirectoryDumper {
  directory: PathBuf,
}

impl FromUrlWithScheme for DirectoryDumper {
  const SCHEME: &'static str = "dump";
}

impl FromUrl for DirectoryDumper {
  type Error = DumpError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DumpError::SchemeMismatch);
    }
    Ok(DirectoryDumper::new(url.path()))
  }
}

impl DirectoryDumper {
  pub fn new(directory: impl AsRef<Path>) -> Self {
    Self {
      directory: directory.as_ref().to_path_buf(),
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn dump(&self, image: &RgbImage, name: &str) -> Result<PathBuf, DumpError> {
    std::fs::create_dir_all(&self.directory)?;
    let path = self.directory.join(name);
    image.save(&path)?;
    debug!("中间图像已保存: {}", path.display());
    Ok(path)
  }
}

/// 转储失败只记录日志，不影响本次分析
pub fn dump_intermediate(dumper: Option<&DirectoryDumper>, image: &RgbImage, name: &str) {
  if let Some(dumper) = dumper
    && let Err(e) = dumper.dump(image, name)
  {
    warn!("保存中间图像 {} 失败: {}", name, e);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn writes_named_file() {
    let dir = tempfile::tempdir().unwrap();
    let dumper = DirectoryDumper::new(dir.path().join("debug"));
    let path = dumper.dump(&RgbImage::new(3, 2), CROPPED_IMAGE_FILE).unwrap();
    assert!(path.ends_with("debug/cropped.png"));
    assert_eq!(image::open(&path).unwrap().to_rgb8().dimensions(), (3, 2));
  }

  #[test]
  fn failures_are_not_propagated() {
    let file = tempfile::NamedTempFile::new().unwrap();
    // 目录路径实际是一个文件，写入必然失败
    let dumper = DirectoryDumper::new(file.path());
    dump_intermediate(Some(&dumper), &RgbImage::new(1, 1), STYLED_IMAGE_FILE);
    dump_intermediate(None, &RgbImage::new(1, 1), STYLED_IMAGE_FILE);
  }
}
