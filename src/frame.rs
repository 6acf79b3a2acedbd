// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/frame.rs - 推理前的像素帧
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

use image::{ImageBuffer, Rgb, RgbImage, imageops::FilterType};
use tracing::{debug, warn};

use crate::{
  processor::BoundingBox,
  status::{Status, StatusCode, SupportStatus},
};

const RGB_CHANNELS: usize = 3;

fn image_processing_error(message: impl Into<String>) -> Status {
  Status::new(
    StatusCode::InvalidArgument,
    message,
    SupportStatus::ImageProcessingError,
  )
}

/// 送入任务层的原始像素视图（HWC 排列）
#[derive(Debug, Clone, Copy)]
pub struct ImageData<'a> {
  pub data: &'a [u8],
  pub width: u32,
  pub height: u32,
  pub channels: usize,
}

impl ImageData<'_> {
  pub fn to_frame(&self) -> Result<RgbFrame, Status> {
    RgbFrame::from_pixels(self.data, self.width, self.height, self.channels)
  }
}

/// RGB 像素帧，所有任务的预处理都经过它
#[derive(Debug, Clone)]
pub struct RgbFrame {
  image: RgbImage,
}

impl From<RgbImage> for RgbFrame {
  fn from(image: RgbImage) -> Self {
    RgbFrame { image }
  }
}

impl RgbFrame {
  /// 从 HWC 排列的像素构造，灰度复制到三通道，RGBA 丢弃 alpha
  pub fn from_pixels(
    data: &[u8],
    width: u32,
    height: u32,
    channels: usize,
  ) -> Result<Self, Status> {
    let Some(expected) = (width as usize)
      .checked_mul(height as usize)
      .and_then(|n| n.checked_mul(channels))
    else {
      return Err(image_processing_error(format!(
        "Image size {}x{}x{} is too large",
        width, height, channels
      )));
    };
    if data.len() != expected {
      return Err(image_processing_error(format!(
        "Image buffer size mismatch: expected {} bytes, found {}",
        expected,
        data.len()
      )));
    }

    let image = match channels {
      1 => ImageBuffer::from_fn(width, height, |x, y| {
        let v = data[y as usize * width as usize + x as usize];
        Rgb([v, v, v])
      }),
      3 => RgbImage::from_raw(width, height, data.to_vec())
        .ok_or_else(|| image_processing_error("Invalid RGB image buffer"))?,
      4 => ImageBuffer::from_fn(width, height, |x, y| {
        let idx = (y as usize * width as usize + x as usize) * 4;
        Rgb([data[idx], data[idx + 1], data[idx + 2]])
      }),
      other => {
        warn!("不支持的通道数: {}", other);
        return Err(image_processing_error(format!(
          "Unsupported number of channels: {}",
          other
        )));
      }
    };

    Ok(RgbFrame { image })
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn as_rgb_image(&self) -> &RgbImage {
    &self.image
  }

  pub fn into_rgb_image(self) -> RgbImage {
    self.image
  }

  /// 裁剪到感兴趣区域；区域越界直接报错，不做截断
  pub fn crop(&self, roi: &BoundingBox) -> Result<RgbFrame, Status> {
    let (w, h) = (self.width() as i64, self.height() as i64);
    let (x, y) = (roi.origin_x as i64, roi.origin_y as i64);
    let (rw, rh) = (roi.width as i64, roi.height as i64);

    if x < 0 || y < 0 || rw <= 0 || rh <= 0 || x + rw > w || y + rh > h {
      warn!("感兴趣区域 {:?} 超出图像范围 {}x{}", roi, w, h);
      return Err(image_processing_error(format!(
        "Invalid crop coordinates: region ({}, {}, {}x{}) is out of bounds of {}x{} image",
        x, y, rw, rh, w, h
      )));
    }

    debug!("裁剪感兴趣区域: {:?}", roi);
    let cropped = image::imageops::crop_imm(
      &self.image,
      x as u32,
      y as u32,
      rw as u32,
      rh as u32,
    )
    .to_image();
    Ok(RgbFrame { image: cropped })
  }

  pub fn resize(&self, width: u32, height: u32) -> RgbFrame {
    if self.width() == width && self.height() == height {
      return self.clone();
    }
    debug!(
      "缩放图像: {}x{} -> {}x{}",
      self.width(),
      self.height(),
      width,
      height
    );
    RgbFrame {
      image: image::imageops::resize(&self.image, width, height, FilterType::Triangle),
    }
  }

  /// 输出 NHWC 字节，`channels` 为 1 时转为灰度
  pub fn to_nhwc(&self, channels: usize) -> Result<Vec<u8>, Status> {
    match channels {
      RGB_CHANNELS => Ok(self.image.as_raw().clone()),
      1 => Ok(
        self
          .image
          .pixels()
          .map(|p| {
            let [r, g, b] = p.0;
            (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
          })
          .collect(),
      ),
      other => Err(image_processing_error(format!(
        "Model input expects unsupported number of channels: {}",
        other
      ))),
    }
  }
}
