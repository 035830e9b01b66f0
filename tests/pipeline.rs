// 该文件是 Kuangjing （框景） 项目的一部分。
// tests/pipeline.rs - 端到端检测流程测试
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

#![cfg(feature = "model_replay")]

use std::path::Path;

use approx::assert_abs_diff_eq;
use image::{Rgb, RgbImage};
use url::Url;

use kuangjing::{
  FromUrl,
  analyzer::{Analyzer, ObjectDetectionAnalyzer},
  config::DetectionConfig,
  frame::CameraFrame,
  geometry::{AspectPolicy, FrameSize, FrameSpace, FrameToTensorMapper, Rotation, TensorSpace},
  input::InputWrapper,
  model::ReplayBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

const RECORDED: &str = r#"[
  {"id": "0", "label": "person", "confidence": 0.9,
   "location": {"left": 0.0, "top": 0.0, "right": 416.0, "bottom": 416.0}},
  {"id": "1", "label": "bicycle", "confidence": 0.05,
   "location": {"left": 10.0, "top": 10.0, "right": 20.0, "bottom": 20.0}},
  {"id": "2", "label": "car", "confidence": 0.6}
]"#;

fn write_recording(dir: &Path) -> std::path::PathBuf {
  let path = dir.join("results.json");
  std::fs::write(&path, RECORDED).unwrap();
  path
}

#[test]
fn full_tensor_box_maps_back_to_prescale_crop_region() {
  let dir = tempfile::tempdir().unwrap();
  let builder = ReplayBuilder::new(write_recording(dir.path()));

  for rotation in [Rotation::Deg0, Rotation::Deg90, Rotation::Deg270] {
    let mut analyzer = ObjectDetectionAnalyzer::new(DetectionConfig::default(), builder.clone());
    let frame = CameraFrame::new(RgbImage::new(1280, 720)).with_rotation(rotation);

    let analysis = analyzer.analyze(&frame).completed().unwrap();
    assert_eq!(analysis.result.len(), 1, "{rotation:?}");

    let person = &analysis.result[0];
    assert_eq!(person.label, "person");
    let bbox = person.location.unwrap();
    assert_abs_diff_eq!(bbox.left, 160.0, epsilon = 1e-2);
    assert_abs_diff_eq!(bbox.top, 0.0, epsilon = 1e-2);
    assert_abs_diff_eq!(bbox.right, 1120.0, epsilon = 1e-2);
    assert_abs_diff_eq!(bbox.bottom, 720.0, epsilon = 1e-2);
  }
}

#[test]
fn stretch_mapping_round_trips_corners() {
  let mapper = FrameToTensorMapper::square(416, AspectPolicy::Stretch);
  let mapping = mapper
    .map::<FrameSpace, TensorSpace>(FrameSize::new(640, 480), Rotation::Deg0)
    .unwrap();

  let (x, y) = mapping.forward.map_point(640.0, 480.0);
  assert_abs_diff_eq!(x, 416.0, epsilon = 1e-3);
  assert_abs_diff_eq!(y, 416.0, epsilon = 1e-3);

  let (x, y) = mapping.inverse.map_point(208.0, 208.0);
  assert_abs_diff_eq!(x, 320.0, epsilon = 1e-3);
  assert_abs_diff_eq!(y, 240.0, epsilon = 1e-3);
}

#[test]
fn missing_recording_fails_the_cycle_instead_of_reporting_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let mut analyzer = ObjectDetectionAnalyzer::new(
    DetectionConfig::default(),
    ReplayBuilder::new(dir.path().join("absent.json")),
  );
  let frame = CameraFrame::new(RgbImage::new(640, 480));
  assert!(analyzer.analyze(&frame).is_failed());

  write_recording(dir.path());
  std::fs::rename(dir.path().join("results.json"), dir.path().join("absent.json")).unwrap();
  assert!(analyzer.analyze(&frame).completed().is_some());
}

#[test]
fn one_shot_task_renders_remapped_boxes() {
  let dir = tempfile::tempdir().unwrap();
  let recording = write_recording(dir.path());
  let input_path = dir.path().join("frame.png");
  let output_path = dir.path().join("out").join("overlay.png");
  RgbImage::from_pixel(1280, 720, Rgb([40, 40, 40]))
    .save(&input_path)
    .unwrap();

  let input = InputWrapper::from_url(&Url::parse(&format!("image://{}", input_path.display())).unwrap())
    .unwrap();
  let model = ReplayBuilder::from_url(&Url::parse(&format!("replay://{}", recording.display())).unwrap())
    .unwrap();
  let output =
    OutputWrapper::from_url(&Url::parse(&format!("image://{}", output_path.display())).unwrap())
      .unwrap();

  OneShotTask
    .run_task(input, ObjectDetectionAnalyzer::new(DetectionConfig::default(), model), output)
    .unwrap();

  let overlay = image::open(&output_path).unwrap().to_rgb8();
  assert_eq!(overlay.dimensions(), (1280, 720));
  assert_eq!(overlay.get_pixel(160, 360), &Rgb([0, 0, 255]));
  assert_eq!(overlay.get_pixel(640, 360), &Rgb([40, 40, 40]));
}
