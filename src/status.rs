// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/status.rs - 推理引擎状态错误
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

//! 引擎边界上的状态错误。
//!
//! 文本格式与上游任务库保持一致：
//! `<STATUS_CODE>: <message> [tflite::support::TfLiteSupportStatus='<code>']`，
//! 调用方可能按字符串匹配，因此不要修改格式。

use std::fmt;

use thiserror::Error;

/// 通用状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
  Unknown,
  InvalidArgument,
  NotFound,
  PermissionDenied,
  FailedPrecondition,
  Internal,
  Unimplemented,
}

impl StatusCode {
  pub fn as_str(&self) -> &'static str {
    match self {
      StatusCode::Unknown => "UNKNOWN",
      StatusCode::InvalidArgument => "INVALID_ARGUMENT",
      StatusCode::NotFound => "NOT_FOUND",
      StatusCode::PermissionDenied => "PERMISSION_DENIED",
      StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
      StatusCode::Internal => "INTERNAL",
      StatusCode::Unimplemented => "UNIMPLEMENTED",
    }
  }
}

impl fmt::Display for StatusCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 任务库细分错误码，数值写入错误文本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SupportStatus {
  Error = 1,
  InvalidArgumentError = 2,
  FileNotFoundError = 100,
  FilePermissionDeniedError = 101,
  FileReadError = 102,
  InvalidModelError = 200,
  AssociatedFileNotFoundError = 300,
  InvalidNumInputTensorsError = 400,
  InvalidInputTensorDimensionsError = 401,
  InvalidNumOutputTensorsError = 402,
  InvalidOutputTensorDimensionsError = 403,
  ImageProcessingError = 500,
  EngineRuntimeError = 600,
}

impl SupportStatus {
  pub fn code(&self) -> i32 {
    *self as i32
  }
}

const SUPPORT_STATUS_TAG: &str = "tflite::support::TfLiteSupportStatus";

/// 推理引擎返回的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message} [{tag}='{payload}']", tag = SUPPORT_STATUS_TAG, payload = .support.code())]
pub struct Status {
  code: StatusCode,
  message: String,
  support: SupportStatus,
}

impl Status {
  pub fn new(code: StatusCode, message: impl Into<String>, support: SupportStatus) -> Self {
    Status {
      code,
      message: message.into(),
      support,
    }
  }

  pub fn invalid_argument(message: impl Into<String>) -> Self {
    Status::new(
      StatusCode::InvalidArgument,
      message,
      SupportStatus::InvalidArgumentError,
    )
  }

  pub fn internal(message: impl Into<String>, support: SupportStatus) -> Self {
    Status::new(StatusCode::Internal, message, support)
  }

  pub fn code(&self) -> StatusCode {
    self.code
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn support_status(&self) -> SupportStatus {
    self.support
  }
}
