//! Clipboard helpers for copying the extraction output

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("没有可复制的内容")]
    Empty,
    #[error("clipboard error: {0}")]
    Clip(String),
}

/// 将提取结果复制到系统剪贴板；空白文本直接拒绝
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    use copypasta::{ClipboardContext, ClipboardProvider};
    if text.trim().is_empty() {
        return Err(ClipboardError::Empty);
    }
    let mut ctx = ClipboardContext::new().map_err(|e| ClipboardError::Clip(e.to_string()))?;
    ctx.set_contents(text.to_string())
        .map_err(|e| ClipboardError::Clip(e.to_string()))
}

/// 从系统剪贴板获取文本（用于测试）
#[cfg(test)]
fn get_clipboard_contents() -> Result<String, ClipboardError> {
    use copypasta::{ClipboardContext, ClipboardProvider};
    let mut ctx = ClipboardContext::new().map_err(|e| ClipboardError::Clip(e.to_string()))?;
    ctx.get_contents()
        .map_err(|e| ClipboardError::Clip(e.to_string()))
}
