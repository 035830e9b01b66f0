// 该文件是 Kuangjing （框景） 项目的一部分。
// src/bin/simple_continueshot.rs - 连续目标检测
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

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
  task::{ContinuousTask, Task},
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

  /// 处理指定帧数后退出
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
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

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .run_task(input, analyzer, output)?;

  Ok(())
}
