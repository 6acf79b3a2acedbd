// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// tests/object_detector.rs - 目标检测集成测试
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

mod common;

use std::path::Path;

use common::{FakeEngine, black_image, model_json, write_file};
use shanan_task::{
  core::BaseOptions,
  processor::{BoundingBox, DetectionOptions},
  status::{StatusCode, SupportStatus},
  vision::{ObjectDetector, ObjectDetectorOptions, TensorImage},
};
use tempfile::TempDir;

const IMAGE_WIDTH: usize = 640;
const IMAGE_HEIGHT: usize = 480;

/// SSD 后处理输出：位置 [y_min, x_min, y_max, x_max]、类别、分数、数量
fn ssd_model() -> Vec<u8> {
  model_json(
    &[vec![1, 8, 8, 3]],
    &[
      (
        vec![1, 3, 4],
        vec![
          0.2, 0.1, 0.8, 0.7, //
          0.5, 0.5, 1.0, 1.0, //
          0.0, 0.0, 0.25, 0.25,
        ],
      ),
      (vec![1, 3], vec![16.0, 17.0, 1.0]),
      (vec![1, 3], vec![0.64453125, 0.59765625, 0.3]),
      (vec![1], vec![3.0]),
    ],
  )
}

fn labels() -> String {
  (0..18)
    .map(|i| match i {
      1 => "person".to_string(),
      16 => "cat".to_string(),
      17 => "dog".to_string(),
      other => format!("class_{}", other),
    })
    .collect::<Vec<_>>()
    .join("\n")
}

struct Fixture {
  _dir: TempDir,
  base_options: BaseOptions,
}

fn fixture() -> Fixture {
  let dir = tempfile::tempdir().unwrap();
  let model = write_file(dir.path(), "ssd.json", ssd_model());
  let labels = write_file(dir.path(), "labels.txt", labels());
  Fixture {
    base_options: BaseOptions::from_file(model).label_file(labels),
    _dir: dir,
  }
}

fn detector(fixture: &Fixture, options: DetectionOptions) -> ObjectDetector<FakeEngine> {
  let options =
    ObjectDetectorOptions::new(fixture.base_options.clone()).detection_options(options);
  ObjectDetector::create_from_options(options).unwrap()
}

#[test]
fn detect_matches_reference_results() {
  let fixture = fixture();
  let detector = detector(&fixture, DetectionOptions::default());
  let pixels = black_image(IMAGE_WIDTH, IMAGE_HEIGHT);
  let image = TensorImage::create_from_array(&pixels, &[IMAGE_HEIGHT, IMAGE_WIDTH, 3]).unwrap();

  let result = detector.detect(&image).unwrap();
  assert_eq!(result.len(), 3);

  let first = &result.detections[0];
  assert_eq!(first.bounding_box, BoundingBox::new(64, 96, 384, 288));
  let category = first.top_category().unwrap();
  assert!((category.score - 0.64453125).abs() < 1e-6);
  assert_eq!(category.index, 16);
  assert_eq!(category.class_name, "cat");

  assert_eq!(result.detections[1].bounding_box, BoundingBox::new(320, 240, 320, 240));
  assert_eq!(result.detections[2].classes[0].class_name, "person");
}

#[test]
fn detect_respects_max_results() {
  let fixture = fixture();
  let detector = detector(&fixture, DetectionOptions::default().max_results(2));
  let pixels = black_image(IMAGE_WIDTH, IMAGE_HEIGHT);
  let image = TensorImage::create_from_array(&pixels, &[IMAGE_HEIGHT, IMAGE_WIDTH, 3]).unwrap();

  let result = detector.detect(&image).unwrap();
  assert!(result.len() <= 2);
  assert_eq!(result.detections[0].classes[0].class_name, "cat");
}

#[test]
fn detect_respects_score_threshold() {
  let fixture = fixture();
  let threshold = 0.5;
  let detector = detector(&fixture, DetectionOptions::default().score_threshold(threshold));
  let pixels = black_image(IMAGE_WIDTH, IMAGE_HEIGHT);
  let image = TensorImage::create_from_array(&pixels, &[1, IMAGE_HEIGHT, IMAGE_WIDTH, 3]).unwrap();

  let result = detector.detect(&image).unwrap();
  assert_eq!(result.len(), 2);
  for detection in result.detections.iter() {
    assert!(detection.top_category().unwrap().score >= threshold);
  }
}

#[test]
fn detect_applies_allow_and_deny_lists() {
  let fixture = fixture();
  let pixels = black_image(IMAGE_WIDTH, IMAGE_HEIGHT);
  let image = TensorImage::create_from_array(&pixels, &[IMAGE_HEIGHT, IMAGE_WIDTH, 3]).unwrap();

  let allow = detector(&fixture, DetectionOptions::default().allowlist(["dog"]));
  let result = allow.detect(&image).unwrap();
  assert_eq!(result.len(), 1);
  assert_eq!(result.detections[0].classes[0].index, 17);

  let deny = detector(&fixture, DetectionOptions::default().denylist(["cat"]));
  let result = deny.detect(&image).unwrap();
  assert_eq!(result.len(), 2);
  assert!(result.detections.iter().all(|d| d.classes[0].class_name != "cat"));
}

#[test]
fn allowlist_and_denylist_are_mutually_exclusive() {
  let fixture = fixture();
  let options = ObjectDetectorOptions::new(fixture.base_options.clone()).detection_options(
    DetectionOptions::default()
      .allowlist(["foo"])
      .denylist(["bar"]),
  );
  let err = ObjectDetector::<FakeEngine>::create_from_options(options)
    .err()
    .unwrap();
  assert_eq!(
    err.to_string(),
    "INVALID_ARGUMENT: `class_name_whitelist` and `class_name_blacklist` are mutually \
     exclusive options. [tflite::support::TfLiteSupportStatus='2']"
  );
}

#[test]
fn class_lists_require_labels() {
  let dir = tempfile::tempdir().unwrap();
  let model = write_file(dir.path(), "ssd.json", ssd_model());
  let options = ObjectDetectorOptions::new(BaseOptions::from_file(model))
    .detection_options(DetectionOptions::default().allowlist(["cat"]));
  let err = ObjectDetector::<FakeEngine>::create_from_options(options)
    .err()
    .unwrap();
  assert_eq!(err.status().unwrap().code(), StatusCode::FailedPrecondition);
}

#[test]
fn empty_model_source_is_rejected() {
  let options = ObjectDetectorOptions::new(BaseOptions::default());
  let err = ObjectDetector::<FakeEngine>::create_from_options(options)
    .err()
    .unwrap();
  assert!(!err.is_validation());
  assert_eq!(
    err.to_string(),
    "INVALID_ARGUMENT: ExternalFile must specify at least one of 'file_content', \
     'file_name' or 'file_descriptor_meta'. [tflite::support::TfLiteSupportStatus='2']"
  );
}

#[test]
fn missing_model_file_is_not_found() {
  let err = ObjectDetector::<FakeEngine>::create_from_file(Path::new("/nonexistent/ssd.json"))
    .err()
    .unwrap();
  let status = err.status().unwrap();
  assert_eq!(status.code(), StatusCode::NotFound);
  assert_eq!(status.support_status(), SupportStatus::FileNotFoundError);
  assert!(err.to_string().starts_with("NOT_FOUND: Unable to open file at"));
}

#[test]
fn unsupported_output_layout_is_rejected() {
  let model = model_json(
    &[vec![1, 8, 8, 3]],
    &[(vec![1, 4], vec![0.0; 4]), (vec![1, 1], vec![0.0]), (vec![1, 1], vec![0.0])],
  );
  let options = ObjectDetectorOptions::new(BaseOptions::from_content(model));
  let err = ObjectDetector::<FakeEngine>::create_from_options(options)
    .err()
    .unwrap();
  assert_eq!(
    err.status().unwrap().support_status(),
    SupportStatus::InvalidNumOutputTensorsError
  );
}

#[test]
fn create_from_file_uses_default_options() {
  let dir = tempfile::tempdir().unwrap();
  let model = write_file(dir.path(), "ssd.json", ssd_model());
  let detector = ObjectDetector::<FakeEngine>::create_from_file(&model).unwrap();
  assert_eq!(detector.options().detection_options, DetectionOptions::default());
  assert_eq!(detector.options().base_options.file_name.as_deref(), Some(model.as_path()));

  let pixels = black_image(IMAGE_WIDTH, IMAGE_HEIGHT);
  let image = TensorImage::create_from_array(&pixels, &[IMAGE_HEIGHT, IMAGE_WIDTH, 3]).unwrap();
  let result = detector.detect(&image).unwrap();
  assert_eq!(result.len(), 3);
  assert!(result.detections[0].classes[0].class_name.is_empty());
}

#[test]
fn detect_fails_when_a_yolo_head_is_malformed() {
  // 32x32 输入，第一个头有一个命中，其余两个头的输出大小不对
  let mut reg = vec![1.5; 4 * 16];
  let mut cls = vec![-10.0; 2 * 16];
  reg[0] = 0.5;
  cls[0] = 4.0;
  let model = model_json(
    &[vec![1, 32, 32, 3]],
    &[
      (vec![1, 64], reg),
      (vec![1, 32], cls),
      (vec![1, 7], vec![0.0; 7]),
      (vec![1, 5], vec![0.0; 5]),
      (vec![1, 3], vec![0.0; 3]),
      (vec![1, 11], vec![0.0; 11]),
    ],
  );
  let options = ObjectDetectorOptions::new(BaseOptions::from_content(model));
  let detector = ObjectDetector::<FakeEngine>::create_from_options(options).unwrap();

  let pixels = black_image(32, 32);
  let image = TensorImage::create_from_array(&pixels, &[32, 32, 3]).unwrap();
  let err = detector.detect(&image).unwrap_err();
  let status = err.status().unwrap();
  assert_eq!(status.code(), StatusCode::Internal);
  assert_eq!(status.support_status(), SupportStatus::InvalidOutputTensorDimensionsError);
}
