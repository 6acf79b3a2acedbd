// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/vision/image_classifier.rs - 图像分类
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
  backend::ImageClassifierBackend,
  core::BaseOptions,
  engine::{InferenceEngine, LoadEngine},
  error::TaskResult,
  processor::{BoundingBox, ClassificationOptions, ClassificationResult},
  vision::TensorImage,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageClassifierOptions {
  pub base_options: BaseOptions,
  pub classification_options: ClassificationOptions,
}

impl ImageClassifierOptions {
  pub fn new(base_options: BaseOptions) -> Self {
    ImageClassifierOptions {
      base_options,
      classification_options: ClassificationOptions::default(),
    }
  }

  pub fn classification_options(mut self, options: ClassificationOptions) -> Self {
    self.classification_options = options;
    self
  }
}

pub struct ImageClassifier<E> {
  backend: ImageClassifierBackend<E>,
  options: ImageClassifierOptions,
}

impl<E: LoadEngine> ImageClassifier<E> {
  pub fn create_from_file(path: impl AsRef<Path>) -> TaskResult<Self> {
    let base_options = BaseOptions::from_file(path.as_ref());
    Self::create_from_options(ImageClassifierOptions::new(base_options))
  }

  pub fn create_from_options(options: ImageClassifierOptions) -> TaskResult<Self> {
    let backend = ImageClassifierBackend::create_from_options(
      &options.base_options,
      &options.classification_options,
    )?;
    Ok(ImageClassifier { backend, options })
  }
}

impl<E: InferenceEngine> ImageClassifier<E> {
  pub fn options(&self) -> &ImageClassifierOptions {
    &self.options
  }

  /// 对整幅图像或 `roi` 区域分类
  pub fn classify(
    &self,
    image: &TensorImage<'_>,
    roi: Option<&BoundingBox>,
  ) -> TaskResult<ClassificationResult> {
    Ok(self.backend.classify(&image.as_image_data(), roi)?)
  }
}
