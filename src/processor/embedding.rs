// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/processor/embedding.rs - 特征向量运算
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

use crate::{processor::FeatureVector, status::Status};

/// 原地 L2 归一化，零向量保持不变
pub fn l2_normalize(values: &mut [f32]) {
  let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
  if norm == 0.0 {
    return;
  }
  for v in values.iter_mut() {
    *v /= norm;
  }
}

/// 标量量化：`round(v * 128)` 截断到 `[-128, 127]`
pub fn quantize(values: &[f32]) -> Vec<i8> {
  values
    .iter()
    .map(|v| (v * 128.0).round().clamp(-128.0, 127.0) as i8)
    .collect()
}

fn cosine<T: Copy + Into<f64>>(u: &[T], v: &[T]) -> Result<f64, Status> {
  let (mut dot, mut norm_u, mut norm_v) = (0.0f64, 0.0f64, 0.0f64);
  for (&a, &b) in u.iter().zip(v) {
    let (a, b): (f64, f64) = (a.into(), b.into());
    dot += a * b;
    norm_u += a * a;
    norm_v += b * b;
  }
  if norm_u <= 0.0 || norm_v <= 0.0 {
    return Err(Status::invalid_argument(
      "Cannot compute cosine similarity on feature vector with 0 norm",
    ));
  }
  Ok(dot / (norm_u.sqrt() * norm_v.sqrt()))
}

/// 余弦相似度，两个向量必须同为浮点或同为量化，且长度一致
pub fn cosine_similarity(u: &FeatureVector, v: &FeatureVector) -> Result<f64, Status> {
  if u.len() != v.len() {
    return Err(Status::invalid_argument(format!(
      "Cannot compute cosine similarity between feature vectors of different sizes ({} vs {})",
      u.len(),
      v.len()
    )));
  }

  match (u, v) {
    (FeatureVector::Float(a), FeatureVector::Float(b)) => cosine(a, b),
    (FeatureVector::Quantized(a), FeatureVector::Quantized(b)) => cosine(a, b),
    _ => Err(Status::invalid_argument(
      "Cannot compute cosine similarity on quantized and float feature vectors",
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_l2_normalize() {
    let mut values = [3.0, 4.0];
    l2_normalize(&mut values);
    assert!((values[0] - 0.6).abs() < 1e-6);
    assert!((values[1] - 0.8).abs() < 1e-6);

    let mut zeros = [0.0, 0.0];
    l2_normalize(&mut zeros);
    assert_eq!(zeros, [0.0, 0.0]);
  }

  #[test]
  fn test_quantize_clamps() {
    assert_eq!(quantize(&[0.5, -1.0, 1.0, 0.0]), vec![64, -128, 127, 0]);
  }

  #[test]
  fn test_cosine_similarity_float() {
    let u = FeatureVector::Float(vec![1.0, 0.0]);
    let v = FeatureVector::Float(vec![1.0, 1.0]);
    let sim = cosine_similarity(&u, &v).unwrap();
    assert!((sim - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    assert!((cosine_similarity(&u, &u).unwrap() - 1.0).abs() < 1e-9);
  }

  #[test]
  fn test_cosine_similarity_quantized() {
    let u = FeatureVector::Quantized(vec![10, -10]);
    let v = FeatureVector::Quantized(vec![-10, 10]);
    assert!((cosine_similarity(&u, &v).unwrap() + 1.0).abs() < 1e-9);
  }

  #[test]
  fn test_cosine_similarity_errors() {
    let float = FeatureVector::Float(vec![1.0, 2.0]);
    let short = FeatureVector::Float(vec![1.0]);
    let quantized = FeatureVector::Quantized(vec![1, 2]);
    let zero = FeatureVector::Float(vec![0.0, 0.0]);

    assert!(
      cosine_similarity(&float, &short)
        .unwrap_err()
        .message()
        .contains("(2 vs 1)")
    );
    assert!(cosine_similarity(&float, &quantized).is_err());
    assert!(cosine_similarity(&float, &zero).is_err());
  }
}
