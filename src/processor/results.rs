// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/processor/results.rs - 任务结果
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

use serde::{Deserialize, Serialize};

/// 输入图像像素坐标下的矩形
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
  pub origin_x: i32,
  pub origin_y: i32,
  pub width: i32,
  pub height: i32,
}

impl BoundingBox {
  pub fn new(origin_x: i32, origin_y: i32, width: i32, height: i32) -> Self {
    BoundingBox {
      origin_x,
      origin_y,
      width,
      height,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub index: i32,
  pub score: f32,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub display_name: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub class_name: String,
}

/// 单个分类头的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classifications {
  pub classes: Vec<Category>,
  pub head_index: i32,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub head_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
  pub classifications: Vec<Classifications>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub bounding_box: BoundingBox,
  pub classes: Vec<Category>,
}

impl Detection {
  /// 得分最高的类别
  pub fn top_category(&self) -> Option<&Category> {
    self.classes.first()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
  pub detections: Vec<Detection>,
}

impl DetectionResult {
  pub fn len(&self) -> usize {
    self.detections.len()
  }

  pub fn is_empty(&self) -> bool {
    self.detections.is_empty()
  }
}

/// 特征向量，浮点或 int8 量化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureVector {
  Float(Vec<f32>),
  Quantized(Vec<i8>),
}

impl FeatureVector {
  pub fn len(&self) -> usize {
    match self {
      FeatureVector::Float(values) => values.len(),
      FeatureVector::Quantized(values) => values.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn is_quantized(&self) -> bool {
    matches!(self, FeatureVector::Quantized(_))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
  pub feature_vector: FeatureVector,
  pub output_index: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
  pub embeddings: Vec<Embedding>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_detection_serializes_like_upstream_json() {
    let result = DetectionResult {
      detections: vec![Detection {
        bounding_box: BoundingBox::new(54, 396, 393, 196),
        classes: vec![Category {
          index: 16,
          score: 0.64453125,
          display_name: String::new(),
          class_name: "cat".to_string(),
        }],
      }],
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["detections"][0]["bounding_box"]["origin_x"], 54);
    assert_eq!(json["detections"][0]["classes"][0]["class_name"], "cat");
    assert!(json["detections"][0]["classes"][0].get("display_name").is_none());
  }

  #[test]
  fn test_feature_vector_len() {
    assert_eq!(FeatureVector::Float(vec![0.0; 4]).len(), 4);
    assert!(FeatureVector::Quantized(vec![1, 2]).is_quantized());
    assert!(FeatureVector::Float(Vec::new()).is_empty());
  }
}
