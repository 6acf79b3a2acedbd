// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/vision/object_detector.rs - 目标检测
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

use std::path::Path;

use crate::{
  backend::ObjectDetectorBackend,
  core::BaseOptions,
  engine::{InferenceEngine, LoadEngine},
  error::TaskResult,
  processor::{DetectionOptions, DetectionResult},
  vision::TensorImage,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDetectorOptions {
  pub base_options: BaseOptions,
  pub detection_options: DetectionOptions,
}

impl ObjectDetectorOptions {
  pub fn new(base_options: BaseOptions) -> Self {
    ObjectDetectorOptions {
      base_options,
      detection_options: DetectionOptions::default(),
    }
  }

  pub fn detection_options(mut self, options: DetectionOptions) -> Self {
    self.detection_options = options;
    self
  }
}

pub struct ObjectDetector<E> {
  backend: ObjectDetectorBackend<E>,
  options: ObjectDetectorOptions,
}

impl<E: LoadEngine> ObjectDetector<E> {
  pub fn create_from_file(path: impl AsRef<Path>) -> TaskResult<Self> {
    let base_options = BaseOptions::from_file(path.as_ref());
    Self::create_from_options(ObjectDetectorOptions::new(base_options))
  }

  pub fn create_from_options(options: ObjectDetectorOptions) -> TaskResult<Self> {
    let backend =
      ObjectDetectorBackend::create_from_options(&options.base_options, &options.detection_options)?;
    Ok(ObjectDetector { backend, options })
  }
}

impl<E: InferenceEngine> ObjectDetector<E> {
  pub fn options(&self) -> &ObjectDetectorOptions {
    &self.options
  }

  pub fn detect(&self, image: &TensorImage<'_>) -> TaskResult<DetectionResult> {
    Ok(self.backend.detect(&image.as_image_data())?)
  }
}
