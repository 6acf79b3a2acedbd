// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/backend/image_classifier.rs - 图像分类后端
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

use tracing::{debug, info};

use crate::{
  backend::{ImageInputSpec, check_output_count},
  core::{BaseOptions, LabelMap, load_model},
  engine::{InferenceEngine, InputTensor, LoadEngine},
  frame::ImageData,
  processor::{
    BoundingBox, Category, CategoryFilter, ClassificationOptions, ClassificationResult,
    Classifications,
  },
  status::Status,
};

pub struct ImageClassifierBackend<E> {
  engine: E,
  input: ImageInputSpec,
  labels: Option<LabelMap>,
  filter: CategoryFilter,
}

impl<E: LoadEngine> ImageClassifierBackend<E> {
  pub fn create_from_options(
    base_options: &BaseOptions,
    options: &ClassificationOptions,
  ) -> Result<Self, Status> {
    info!("创建图像分类任务");
    let model = load_model(base_options)?;
    let labels = LabelMap::load(base_options, options.locale())?;
    let filter = CategoryFilter::from_classification_options(options, labels.as_ref())?;
    let engine = E::load(&model, &base_options.compute_settings)?;
    Self::with_engine(engine, labels, filter)
  }
}

impl<E: InferenceEngine> ImageClassifierBackend<E> {
  pub fn with_engine(
    engine: E,
    labels: Option<LabelMap>,
    filter: CategoryFilter,
  ) -> Result<Self, Status> {
    let input = ImageInputSpec::from_engine(&engine)?;
    debug!("分类头数量: {}", engine.output_shapes().len());
    Ok(ImageClassifierBackend {
      engine,
      input,
      labels,
      filter,
    })
  }

  fn category(&self, index: usize, score: f32) -> Category {
    let labels = self.labels.as_ref();
    Category {
      index: index as i32,
      score,
      display_name: labels
        .and_then(|l| l.display_name(index))
        .unwrap_or_default()
        .to_string(),
      class_name: labels
        .and_then(|l| l.class_name(index))
        .unwrap_or_default()
        .to_string(),
    }
  }

  pub fn classify(
    &self,
    image: &ImageData<'_>,
    roi: Option<&BoundingBox>,
  ) -> Result<ClassificationResult, Status> {
    let data = self.input.preprocess(image, roi)?;
    let shape = self.input.shape();
    let outputs = self
      .engine
      .run(&[InputTensor::UInt8 { data: &data, shape: &shape }])?;
    check_output_count(outputs.len(), self.engine.output_shapes().len())?;

    let classifications = outputs
      .iter()
      .enumerate()
      .map(|(head_index, output)| {
        let mut classes: Vec<Category> = output
          .as_slice()
          .iter()
          .enumerate()
          .filter(|&(index, &score)| self.filter.accepts(index, score))
          .map(|(index, &score)| self.category(index, score))
          .collect();
        classes.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(max) = self.filter.max_results() {
          classes.truncate(max);
        }
        debug!("分类头 {}: {} 个类别", head_index, classes.len());
        Classifications {
          classes,
          head_index: head_index as i32,
          head_name: String::new(),
        }
      })
      .collect();

    Ok(ClassificationResult { classifications })
  }
}
