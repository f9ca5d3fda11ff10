//! suspense-wire エラー型

/// Wire Format 層のエラー
#[derive(Debug)]
pub enum WireError {
    /// line-delimited レコードの JSON デコード失敗
    BadRecord(serde_json::Error),
}

impl core::fmt::Display for WireError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WireError::BadRecord(e) => write!(f, "Invalid line-delimited record: {}", e),
        }
    }
}
