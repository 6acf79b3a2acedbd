// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use tracing::debug;

use crate::processor::{BoundingBox, DetectionResult};

const BOX_COLOR: [u8; 3] = [0, 0, 255]; // 蓝色
const BOX_THICKNESS: i32 = 2;

pub struct Draw {
  color: [u8; 3],
  thickness: i32,
}

impl Default for Draw {
  fn default() -> Self {
    Draw {
      color: BOX_COLOR,
      thickness: BOX_THICKNESS,
    }
  }
}

impl Draw {
  pub fn color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }

  pub fn thickness(mut self, thickness: i32) -> Self {
    self.thickness = thickness.max(1);
    self
  }

  // 像素坐标的矩形边框，超出图像的部分截掉
  fn draw_bbox(&self, image: &mut RgbImage, bbox: &BoundingBox) {
    let (w, h) = (image.width() as i32, image.height() as i32);

    let x_min = bbox.origin_x.clamp(0, w - 1);
    let y_min = bbox.origin_y.clamp(0, h - 1);
    let x_max = (bbox.origin_x + bbox.width).clamp(0, w - 1);
    let y_max = (bbox.origin_y + bbox.height).clamp(0, h - 1);

    // 向内加粗
    for t in 0..self.thickness {
      let (width, height) = (x_max - x_min + 1 - 2 * t, y_max - y_min + 1 - 2 * t);
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, Rgb(self.color));
    }
  }

  pub fn draw_detections(&self, image: &mut RgbImage, result: &DetectionResult) {
    if image.width() == 0 || image.height() == 0 {
      return;
    }
    for detection in result.detections.iter() {
      self.draw_bbox(image, &detection.bounding_box);
    }
    debug!("绘制了 {} 个检测框", result.len());
  }
}
