// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/backend/object_detector.rs - 目标检测后端
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
  backend::{
    ImageInputSpec, check_output_count,
    detection_layout::{DetectionLayout, RawDetection},
  },
  core::{BaseOptions, LabelMap, load_model},
  engine::{InferenceEngine, InputTensor, LoadEngine},
  frame::ImageData,
  processor::{
    BoundingBox, Category, CategoryFilter, Detection, DetectionOptions, DetectionResult,
  },
  status::Status,
};

pub struct ObjectDetectorBackend<E> {
  engine: E,
  input: ImageInputSpec,
  layout: DetectionLayout,
  labels: Option<LabelMap>,
  filter: CategoryFilter,
}

impl<E: LoadEngine> ObjectDetectorBackend<E> {
  pub fn create_from_options(
    base_options: &BaseOptions,
    options: &DetectionOptions,
  ) -> Result<Self, Status> {
    info!("创建目标检测任务");
    let model = load_model(base_options)?;
    let labels = LabelMap::load(base_options, options.locale())?;
    let filter = CategoryFilter::from_detection_options(options, labels.as_ref())?;
    let engine = E::load(&model, &base_options.compute_settings)?;
    Self::with_engine(engine, labels, filter)
  }
}

/// 归一化坐标映射回图像像素
fn to_pixel_box(bbox: &[f32; 4], width: u32, height: u32) -> BoundingBox {
  let (w, h) = (width as f32, height as f32);
  let left = (bbox[0] * w).round() as i32;
  let top = (bbox[1] * h).round() as i32;
  let right = (bbox[2] * w).round() as i32;
  let bottom = (bbox[3] * h).round() as i32;
  BoundingBox::new(left, top, right - left, bottom - top)
}

impl<E: InferenceEngine> ObjectDetectorBackend<E> {
  pub fn with_engine(
    engine: E,
    labels: Option<LabelMap>,
    filter: CategoryFilter,
  ) -> Result<Self, Status> {
    let input = ImageInputSpec::from_engine(&engine)?;
    let layout =
      DetectionLayout::from_outputs(engine.output_shapes().len(), input.width, input.height)?;
    debug!("检测输出布局: {:?}", layout);
    Ok(ObjectDetectorBackend {
      engine,
      input,
      layout,
      labels,
      filter,
    })
  }

  fn category(&self, raw: &RawDetection) -> Category {
    let labels = self.labels.as_ref();
    Category {
      index: raw.class_index as i32,
      score: raw.score,
      display_name: labels
        .and_then(|l| l.display_name(raw.class_index))
        .unwrap_or_default()
        .to_string(),
      class_name: labels
        .and_then(|l| l.class_name(raw.class_index))
        .unwrap_or_default()
        .to_string(),
    }
  }

  pub fn detect(&self, image: &ImageData<'_>) -> Result<DetectionResult, Status> {
    let data = self.input.preprocess(image, None)?;
    let shape = self.input.shape();
    let outputs = self
      .engine
      .run(&[InputTensor::UInt8 { data: &data, shape: &shape }])?;
    check_output_count(outputs.len(), self.engine.output_shapes().len())?;

    let raw = self.layout.decode(&outputs, self.filter.score_threshold())?;

    let mut detections = Vec::new();
    for det in raw {
      if self.filter.is_full(detections.len()) {
        break;
      }
      if !self.filter.accepts(det.class_index, det.score) {
        continue;
      }
      detections.push(Detection {
        bounding_box: to_pixel_box(&det.bbox, image.width, image.height),
        classes: vec![self.category(&det)],
      });
    }

    debug!("检测到 {} 个目标", detections.len());
    Ok(DetectionResult { detections })
  }
}
