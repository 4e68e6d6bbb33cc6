//! 验证辅助函数
//!
//! 样本写入前校验，两种存储实现共用。

use crate::error::StorageError;
use domain::SampleDraft;

/// 校验待写入样本：key 非空、数值有限。
pub fn ensure_valid_draft(draft: &SampleDraft) -> Result<(), StorageError> {
    if draft.key.trim().is_empty() {
        return Err(StorageError::validation("sample key required"));
    }
    if !draft.value.is_finite() {
        return Err(StorageError::validation(format!(
            "sample value must be finite: {}={}",
            draft.key, draft.value
        )));
    }
    Ok(())
}
