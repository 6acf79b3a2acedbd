// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/processor/tokenizer.rs - WordPiece 分词
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

use std::collections::HashMap;

use tracing::debug;

use crate::status::Status;

const CLS_TOKEN: &str = "[CLS]";
const SEP_TOKEN: &str = "[SEP]";
const UNK_TOKEN: &str = "[UNK]";
const PAD_TOKEN: &str = "[PAD]";
const SUFFIX_PREFIX: &str = "##";
const MAX_CHARS_PER_WORD: usize = 100;

/// 编码后的模型输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
  pub ids: Vec<i32>,
  pub mask: Vec<i32>,
  pub segment_ids: Vec<i32>,
}

/// BERT 风格的 WordPiece 分词器，词表每行一个 token，行号即 id
#[derive(Debug, Clone)]
pub struct WordpieceTokenizer {
  vocab: HashMap<String, i32>,
  cls_id: i32,
  sep_id: i32,
  unk_id: i32,
  pad_id: i32,
}

fn is_cjk(c: char) -> bool {
  matches!(c as u32,
    0x4E00..=0x9FFF
    | 0x3400..=0x4DBF
    | 0x20000..=0x2A6DF
    | 0x2A700..=0x2B73F
    | 0x2B740..=0x2B81F
    | 0x2B820..=0x2CEAF
    | 0xF900..=0xFAFF
    | 0x2F800..=0x2FA1F)
}

fn is_punctuation(c: char) -> bool {
  c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace() && !c.is_control())
}

/// 小写化，按空白切分，标点和汉字单独成词
fn basic_tokenize(text: &str) -> Vec<String> {
  let mut words = Vec::new();
  let mut current = String::new();
  for c in text.chars().flat_map(char::to_lowercase) {
    if c.is_whitespace() || c.is_control() {
      if !current.is_empty() {
        words.push(std::mem::take(&mut current));
      }
    } else if is_punctuation(c) || is_cjk(c) {
      if !current.is_empty() {
        words.push(std::mem::take(&mut current));
      }
      words.push(c.to_string());
    } else {
      current.push(c);
    }
  }
  if !current.is_empty() {
    words.push(current);
  }
  words
}

impl WordpieceTokenizer {
  pub fn from_vocab(text: &str) -> Result<Self, Status> {
    let vocab: HashMap<String, i32> = text
      .lines()
      .map(str::trim)
      .enumerate()
      .filter(|(_, token)| !token.is_empty())
      .map(|(id, token)| (token.to_string(), id as i32))
      .collect();

    let special = |token: &str| {
      vocab.get(token).copied().ok_or_else(|| {
        Status::invalid_argument(format!("Vocabulary is missing special token {}", token))
      })
    };
    let cls_id = special(CLS_TOKEN)?;
    let sep_id = special(SEP_TOKEN)?;
    let unk_id = special(UNK_TOKEN)?;
    let pad_id = vocab.get(PAD_TOKEN).copied().unwrap_or(0);

    debug!("词表大小: {}", vocab.len());
    Ok(WordpieceTokenizer {
      vocab,
      cls_id,
      sep_id,
      unk_id,
      pad_id,
    })
  }

  pub fn vocab_size(&self) -> usize {
    self.vocab.len()
  }

  fn wordpiece(&self, word: &str, ids: &mut Vec<i32>) {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() > MAX_CHARS_PER_WORD {
      ids.push(self.unk_id);
      return;
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    while start < chars.len() {
      let mut end = chars.len();
      let mut found = None;
      while start < end {
        let mut piece: String = chars[start..end].iter().collect();
        if start > 0 {
          piece.insert_str(0, SUFFIX_PREFIX);
        }
        if let Some(&id) = self.vocab.get(&piece) {
          found = Some(id);
          break;
        }
        end -= 1;
      }
      match found {
        Some(id) => pieces.push(id),
        None => {
          // 任何一段无法匹配，整个词记为 [UNK]
          ids.push(self.unk_id);
          return;
        }
      }
      start = end;
    }
    ids.extend(pieces);
  }

  /// 分词为 id 序列，不含特殊 token
  pub fn tokenize(&self, text: &str) -> Vec<i32> {
    let mut ids = Vec::new();
    for word in basic_tokenize(text) {
      self.wordpiece(&word, &mut ids);
    }
    ids
  }

  /// `[CLS] tokens [SEP]` 并补齐到 `seq_len`，超长时截断
  pub fn encode(&self, text: &str, seq_len: usize) -> Encoding {
    let mut tokens = self.tokenize(text);
    let budget = seq_len.saturating_sub(2);
    if tokens.len() > budget {
      debug!("输入文本 {} 个 token, 截断到 {}", tokens.len(), budget);
      tokens.truncate(budget);
    }

    let mut ids = Vec::with_capacity(seq_len);
    ids.push(self.cls_id);
    ids.extend(tokens);
    ids.push(self.sep_id);
    ids.truncate(seq_len);

    let used = ids.len();
    let mut mask = vec![1; used];
    ids.resize(seq_len, self.pad_id);
    mask.resize(seq_len, 0);

    Encoding {
      ids,
      mask,
      segment_ids: vec![0; seq_len],
    }
  }
}
