// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/backend.rs - 任务后端
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

//! 引擎侧的任务实现：由选项创建、执行推理、整理结果。
//! 这一层的所有错误都是 [`Status`]，上层任务对象原样透传。

use tracing::{debug, error};

use crate::{
  engine::{InferenceEngine, TensorShape},
  frame::ImageData,
  processor::BoundingBox,
  status::{Status, StatusCode, SupportStatus},
};

mod detection_layout;
mod embedding;
mod image_classifier;
mod image_embedder;
mod object_detector;
mod text_embedder;

pub use self::embedding::{EmbeddingPostprocessor, embedding_by_index};
pub use self::image_classifier::ImageClassifierBackend;
pub use self::image_embedder::ImageEmbedderBackend;
pub use self::object_detector::ObjectDetectorBackend;
pub use self::text_embedder::TextEmbedderBackend;

/// 图像模型的输入规格 (height, width, channels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImageInputSpec {
  pub height: usize,
  pub width: usize,
  pub channels: usize,
}

impl ImageInputSpec {
  pub(crate) fn from_engine<E: InferenceEngine>(engine: &E) -> Result<Self, Status> {
    let shapes = engine.input_shapes();
    if shapes.len() != 1 {
      error!("图像模型应当只有 1 个输入, 实际为 {}", shapes.len());
      return Err(Status::new(
        StatusCode::InvalidArgument,
        format!("Image models are expected to have only 1 input, found {}", shapes.len()),
        SupportStatus::InvalidNumInputTensorsError,
      ));
    }

    let (height, width, channels) = shapes[0].as_nhwc().ok_or_else(|| {
      Status::new(
        StatusCode::InvalidArgument,
        format!(
          "Input tensor is expected to have shape [1, height, width, channels], found {:?}",
          shapes[0].dims
        ),
        SupportStatus::InvalidInputTensorDimensionsError,
      )
    })?;

    if channels != 1 && channels != 3 {
      return Err(Status::new(
        StatusCode::InvalidArgument,
        format!("Input tensor is expected to have 1 or 3 channels, found {}", channels),
        SupportStatus::InvalidInputTensorDimensionsError,
      ));
    }

    debug!("模型输入: {}x{}x{}", width, height, channels);
    Ok(ImageInputSpec {
      height,
      width,
      channels,
    })
  }

  pub(crate) fn shape(&self) -> TensorShape {
    TensorShape::new([1, self.height, self.width, self.channels])
  }

  /// 像素转换、可选的区域裁剪、缩放到模型输入
  pub(crate) fn preprocess(
    &self,
    image: &ImageData<'_>,
    roi: Option<&BoundingBox>,
  ) -> Result<Vec<u8>, Status> {
    let frame = image.to_frame()?;
    let frame = match roi {
      Some(roi) => frame.crop(roi)?,
      None => frame,
    };
    frame
      .resize(self.width as u32, self.height as u32)
      .to_nhwc(self.channels)
  }
}

pub(crate) fn check_output_count(
  outputs: usize,
  expected: usize,
) -> Result<(), Status> {
  if outputs != expected {
    return Err(Status::new(
      StatusCode::Internal,
      format!("Engine returned {} outputs, expected {}", outputs, expected),
      SupportStatus::InvalidNumOutputTensorsError,
    ));
  }
  Ok(())
}
