// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/processor/options.rs - 任务选项
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

const DEFAULT_LOCALE: &str = "en";

/// 分类结果过滤选项
///
/// - `max_results`: 每个分类头最多返回的类别数，`None` 或负数表示不限制，0 非法
/// - `score_threshold`: 分数下限（含），`None` 表示不过滤
/// - `class_name_allowlist` / `class_name_denylist`: 互斥，按标签名过滤
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationOptions {
  pub display_names_locale: Option<String>,
  pub max_results: Option<i32>,
  pub score_threshold: Option<f32>,
  pub class_name_allowlist: Vec<String>,
  pub class_name_denylist: Vec<String>,
}

/// 检测结果过滤选项，字段含义同 [`ClassificationOptions`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionOptions {
  pub display_names_locale: Option<String>,
  pub max_results: Option<i32>,
  pub score_threshold: Option<f32>,
  pub class_name_allowlist: Vec<String>,
  pub class_name_denylist: Vec<String>,
}

/// 特征向量选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddingOptions {
  /// 对输出向量做 L2 归一化
  pub l2_normalize: bool,
  /// 标量量化为 int8
  pub quantize: bool,
}

macro_rules! filter_option_builders {
  ($ty:ty) => {
    impl $ty {
      pub fn max_results(mut self, max_results: i32) -> Self {
        self.max_results = Some(max_results);
        self
      }

      pub fn score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = Some(score_threshold);
        self
      }

      pub fn allowlist<I, S>(mut self, names: I) -> Self
      where
        I: IntoIterator<Item = S>,
        S: Into<String>,
      {
        self.class_name_allowlist = names.into_iter().map(Into::into).collect();
        self
      }

      pub fn denylist<I, S>(mut self, names: I) -> Self
      where
        I: IntoIterator<Item = S>,
        S: Into<String>,
      {
        self.class_name_denylist = names.into_iter().map(Into::into).collect();
        self
      }

      pub fn display_names_locale(mut self, locale: impl Into<String>) -> Self {
        self.display_names_locale = Some(locale.into());
        self
      }

      pub fn locale(&self) -> &str {
        self
          .display_names_locale
          .as_deref()
          .unwrap_or(DEFAULT_LOCALE)
      }
    }
  };
}

filter_option_builders!(ClassificationOptions);
filter_option_builders!(DetectionOptions);

impl EmbeddingOptions {
  pub fn l2_normalize(mut self, l2_normalize: bool) -> Self {
    self.l2_normalize = l2_normalize;
    self
  }

  pub fn quantize(mut self, quantize: bool) -> Self {
    self.quantize = quantize;
    self
  }
}
