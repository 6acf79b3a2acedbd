// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/error.rs - 任务错误
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

use thiserror::Error;

use crate::status::Status;

/// 任务对象对外暴露的错误
///
/// `Status` 来自引擎层，原样透传；`Validation` 是进入引擎之前的本地参数检查。
#[derive(Error, Debug)]
pub enum TaskError {
  #[error(transparent)]
  Status(#[from] Status),
  #[error("{0}")]
  Validation(String),
}

impl TaskError {
  pub fn validation(msg: impl Into<String>) -> Self {
    TaskError::Validation(msg.into())
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, TaskError::Validation(_))
  }

  pub fn status(&self) -> Option<&Status> {
    match self {
      TaskError::Status(status) => Some(status),
      TaskError::Validation(_) => None,
    }
  }
}

pub type TaskResult<T> = Result<T, TaskError>;
