// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/processor/filter.rs - 类别过滤
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

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::{
  core::LabelMap,
  processor::{ClassificationOptions, DetectionOptions},
  status::{Status, StatusCode, SupportStatus},
};

/// 由任务选项构造的过滤器，在创建任务时完成全部校验
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryFilter {
  allowed: Option<HashSet<usize>>,
  denied: HashSet<usize>,
  score_threshold: Option<f32>,
  max_results: Option<usize>,
}

fn resolve_names(
  names: &[String],
  labels: &LabelMap,
  option_name: &str,
) -> Result<HashSet<usize>, Status> {
  let mut indices = HashSet::new();
  for name in names.iter().map(|name| name.trim()) {
    if name.is_empty() {
      warn!("{} 中有空类别名, 已忽略", option_name);
      continue;
    }
    match labels.index_of(name) {
      Some(index) => {
        indices.insert(index);
      }
      None => warn!("{} 中的类别 '{}' 不在标签中", option_name, name),
    }
  }

  if indices.is_empty() {
    return Err(Status::invalid_argument(format!(
      "Invalid class names specified via `{}`: none match with model labels.",
      option_name
    )));
  }
  Ok(indices)
}

impl CategoryFilter {
  pub fn new(
    allowlist: &[String],
    denylist: &[String],
    max_results: Option<i32>,
    score_threshold: Option<f32>,
    labels: Option<&LabelMap>,
  ) -> Result<Self, Status> {
    if !allowlist.is_empty() && !denylist.is_empty() {
      return Err(Status::invalid_argument(
        "`class_name_whitelist` and `class_name_blacklist` are mutually exclusive options.",
      ));
    }

    if max_results == Some(0) {
      return Err(Status::invalid_argument(
        "Invalid `max_results` option: value must be != 0",
      ));
    }

    let mut filter = CategoryFilter {
      allowed: None,
      denied: HashSet::new(),
      score_threshold,
      max_results: max_results.and_then(|n| usize::try_from(n).ok()),
    };

    if allowlist.is_empty() && denylist.is_empty() {
      return Ok(filter);
    }

    let Some(labels) = labels else {
      return Err(Status::new(
        StatusCode::FailedPrecondition,
        "Using `class_name_whitelist` or `class_name_blacklist` requires labels to be present.",
        SupportStatus::InvalidArgumentError,
      ));
    };

    if !allowlist.is_empty() {
      filter.allowed = Some(resolve_names(allowlist, labels, "class_name_whitelist")?);
    } else {
      filter.denied = resolve_names(denylist, labels, "class_name_blacklist")?;
    }
    debug!("类别过滤器: {:?}", filter);
    Ok(filter)
  }

  pub fn from_classification_options(
    options: &ClassificationOptions,
    labels: Option<&LabelMap>,
  ) -> Result<Self, Status> {
    CategoryFilter::new(
      &options.class_name_allowlist,
      &options.class_name_denylist,
      options.max_results,
      options.score_threshold,
      labels,
    )
  }

  pub fn from_detection_options(
    options: &DetectionOptions,
    labels: Option<&LabelMap>,
  ) -> Result<Self, Status> {
    CategoryFilter::new(
      &options.class_name_allowlist,
      &options.class_name_denylist,
      options.max_results,
      options.score_threshold,
      labels,
    )
  }

  /// 分数下限（含）与名单检查
  pub fn accepts(&self, index: usize, score: f32) -> bool {
    if let Some(threshold) = self.score_threshold
      && score < threshold
    {
      return false;
    }
    if let Some(allowed) = self.allowed.as_ref() {
      return allowed.contains(&index);
    }
    !self.denied.contains(&index)
  }

  pub fn max_results(&self) -> Option<usize> {
    self.max_results
  }

  pub fn score_threshold(&self) -> Option<f32> {
    self.score_threshold
  }

  pub fn is_full(&self, count: usize) -> bool {
    self.max_results.is_some_and(|max| count >= max)
  }
}
