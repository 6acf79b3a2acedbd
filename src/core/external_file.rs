// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/core/external_file.rs - 模型与附属文件读取
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

use std::{borrow::Cow, io::ErrorKind, path::Path};

use tracing::{debug, error, info};

use crate::{
  core::{BaseOptions, FileDescriptorMeta},
  status::{Status, StatusCode, SupportStatus},
};

fn open_error(path: &Path, err: std::io::Error) -> Status {
  error!("打开文件失败: {}, 错误: {}", path.display(), err);
  match err.kind() {
    ErrorKind::NotFound => Status::new(
      StatusCode::NotFound,
      format!("Unable to open file at {}", path.display()),
      SupportStatus::FileNotFoundError,
    ),
    ErrorKind::PermissionDenied => Status::new(
      StatusCode::PermissionDenied,
      format!("Permission denied when opening file at {}", path.display()),
      SupportStatus::FilePermissionDeniedError,
    ),
    _ => Status::new(
      StatusCode::Unknown,
      format!("Unable to open file at {}: {}", path.display(), err),
      SupportStatus::FileReadError,
    ),
  }
}

/// 读取模型内容
///
/// 优先级：`file_content` > `file_name` > `file_descriptor_meta`。
/// 空的内容或空路径视为未设置。
pub fn load_model(options: &BaseOptions) -> Result<Cow<'_, [u8]>, Status> {
  if let Some(content) = options.file_content.as_deref()
    && !content.is_empty()
  {
    debug!("使用内存中的模型内容, 大小: {} 字节", content.len());
    return Ok(Cow::Borrowed(content));
  }

  if let Some(path) = options.file_name.as_deref()
    && !path.as_os_str().is_empty()
  {
    info!("加载模型文件: {}", path.display());
    let data = std::fs::read(path).map_err(|e| open_error(path, e))?;
    debug!(
      "模型文件大小: {:.2} MB",
      data.len() as f64 / (1024.0 * 1024.0)
    );
    return Ok(Cow::Owned(data));
  }

  if let Some(meta) = options.file_descriptor_meta.as_ref() {
    info!("从文件描述符 {} 加载模型", meta.fd);
    return read_descriptor(meta).map(Cow::Owned);
  }

  Err(Status::invalid_argument(
    "ExternalFile must specify at least one of 'file_content', 'file_name' or 'file_descriptor_meta'.",
  ))
}

/// 读取模型附属文件（标签、显示名、词表）
pub fn read_associated_file(path: &Path) -> Result<String, Status> {
  debug!("读取附属文件: {}", path.display());
  std::fs::read_to_string(path).map_err(|e| open_error(path, e))
}

#[cfg(unix)]
fn read_descriptor(meta: &FileDescriptorMeta) -> Result<Vec<u8>, Status> {
  use std::os::{
    fd::BorrowedFd,
    unix::fs::FileExt,
  };

  if meta.fd < 0 {
    return Err(Status::invalid_argument(format!(
      "Provided file descriptor is invalid: {} < 0",
      meta.fd
    )));
  }

  let read_error = |e: std::io::Error| {
    error!("读取文件描述符 {} 失败: {}", meta.fd, e);
    Status::new(
      StatusCode::Unknown,
      format!("Unable to read file descriptor {}: {}", meta.fd, e),
      SupportStatus::FileReadError,
    )
  };

  // 调用方保证 fd 在本次调用期间有效；复制出独立句柄后不会关闭调用方的 fd
  let borrowed = unsafe { BorrowedFd::borrow_raw(meta.fd) };
  let file = std::fs::File::from(borrowed.try_clone_to_owned().map_err(read_error)?);

  let length = if meta.length > 0 {
    meta.length
  } else {
    let total = file.metadata().map_err(read_error)?.len();
    total.checked_sub(meta.offset).ok_or_else(|| {
      Status::invalid_argument(format!(
        "Provided file offset ({}) exceeds file size ({})",
        meta.offset, total
      ))
    })?
  };

  let mut data = vec![0u8; length as usize];
  file
    .read_exact_at(&mut data, meta.offset)
    .map_err(read_error)?;
  Ok(data)
}

#[cfg(not(unix))]
fn read_descriptor(_meta: &FileDescriptorMeta) -> Result<Vec<u8>, Status> {
  Err(Status::new(
    StatusCode::Unimplemented,
    "File descriptors are only supported on unix platforms",
    SupportStatus::Error,
  ))
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn test_empty_source_is_rejected() {
    let options = BaseOptions::from_file("");
    let err = load_model(&options).unwrap_err();
    assert_eq!(
      err.to_string(),
      "INVALID_ARGUMENT: ExternalFile must specify at least one of 'file_content', \
       'file_name' or 'file_descriptor_meta'. [tflite::support::TfLiteSupportStatus='2']"
    );
  }

  #[test]
  fn test_content_is_borrowed() {
    let options = BaseOptions::from_content(vec![1u8, 2, 3]);
    let model = load_model(&options).unwrap();
    assert!(matches!(model, Cow::Borrowed(_)));
    assert_eq!(&*model, &[1, 2, 3]);
  }

  #[test]
  fn test_missing_file_is_not_found() {
    let options = BaseOptions::from_file("/definitely/not/here.rknn");
    let err = load_model(&options).unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);
    assert_eq!(err.support_status(), SupportStatus::FileNotFoundError);
  }

  #[test]
  fn test_file_name_is_read() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"model-bytes").unwrap();
    let options = BaseOptions::from_file(file.path());
    assert_eq!(&*load_model(&options).unwrap(), b"model-bytes");
  }

  #[cfg(unix)]
  #[test]
  fn test_descriptor_with_offset() {
    use std::os::fd::AsRawFd;

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"headerMODEL").unwrap();
    let options = BaseOptions::from_descriptor(FileDescriptorMeta {
      fd: file.as_raw_fd(),
      length: 0,
      offset: 6,
    });
    assert_eq!(&*load_model(&options).unwrap(), b"MODEL");
  }

  #[cfg(unix)]
  #[test]
  fn test_negative_descriptor_is_invalid() {
    let options = BaseOptions::from_descriptor(FileDescriptorMeta {
      fd: -1,
      length: 0,
      offset: 0,
    });
    let err = load_model(&options).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
  }
}
