// 该文件是 Kuangjing （框景） 项目的一部分。
// src/bin/simple_oneshot.rs - 单帧目标检测
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use kuangjing::{
  FromUrl,
  analyzer::ObjectDetectionAnalyzer,
  config::DetectionConfig,
  dump::DirectoryDumper,
  input::InputWrapper,
  model::ReplayBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Kuangjing 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 回放结果文件, 如 replay:///results.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 检测配置, 如 detection:///model.tflite?input_size=416
  #[arg(long, value_name = "CONFIG")]
  pub config: Option<Url>,
  /// 中间图像转储目录, 如 dump:///tmp/kuangjing
  #[arg(long, value_name = "DUMP")]
  pub dump: Option<Url>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let config = match &args.config {
    Some(url) => DetectionConfig::from_url(url)?,
    None => DetectionConfig::default(),
  };
  let dumper = args.dump.as_ref().map(DirectoryDumper::from_url).transpose()?;

  let input = InputWrapper::from_url(&args.input)?;
  let analyzer =
    ObjectDetectionAnalyzer::new(config, ReplayBuilder::from_url(&args.model)?).with_dumper(dumper);
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input, analyzer, output)?;

  Ok(())
}
