//! 审计记录写入服务 - 业务能力层
//!
//! 只负责把审计记录持久化为 JSON 文件，不关心流程

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::AuditRecord;

/// 审计记录写入服务
pub struct AuditWriter {
    path: PathBuf,
}

impl AuditWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 以格式化 JSON 数组写入全部记录（覆盖旧文件）
    pub async fn write(&self, records: &[AuditRecord]) -> AppResult<()> {
        let path = self.path.display();
        debug!("写入 {} 条审计记录到 {}", records.len(), path);

        let json = serde_json::to_string_pretty(records).map_err(|e| self.error(e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.error(e))?;
        }
        fs::write(&self.path, json)
            .await
            .map_err(|e| self.error(e))?;

        info!("✓ 审计记录已写入: {}", path);
        Ok(())
    }

    /// 读取已有的审计文件
    pub async fn read(&self) -> AppResult<Vec<AuditRecord>> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.error(e))?;
        serde_json::from_str(&content).map_err(|e| self.error(e))
    }

    /// JSON 错误经 `From` 转换为 IO 错误
    fn error(&self, source: impl Into<io::Error>) -> AppError {
        AppError::audit(self.path.display().to_string(), source.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseOption;

    #[tokio::test]
    async fn test_write_then_read_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditWriter::new(dir.path().join("logs").join("completed_courses.json"));

        let records = vec![
            AuditRecord::start(&CourseOption::new("2", "ENG 1011 - English I"), 1).succeed("btn"),
            AuditRecord::start(&CourseOption::new("1", "CSE 1110 - Intro"), 1)
                .fail("evaluation_load_timeout"),
        ];
        writer.write(&records).await.unwrap();

        let loaded = writer.read().await.unwrap();
        assert_eq!(loaded, records);

        let raw = std::fs::read_to_string(writer.path()).unwrap();
        assert!(raw.starts_with("[\n"));
        assert!(raw.contains("\"status\": \"failure\""));
    }

    #[tokio::test]
    async fn test_non_ascii_is_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditWriter::new(dir.path().join("audit.json"));

        let mut record = AuditRecord::start(&CourseOption::new("7", "বাংলা ভাষা"), 1);
        record.faculty_name = Some("Dr. Ñandú".to_string());
        writer.write(&[record.fail("x")]).await.unwrap();

        let raw = std::fs::read_to_string(writer.path()).unwrap();
        assert!(raw.contains("বাংলা ভাষা"));
        assert!(raw.contains("Ñandú"));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_audit_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditWriter::new(dir.path().join("missing.json"));
        match writer.read().await {
            Err(AppError::Audit { path, .. }) => assert!(path.ends_with("missing.json")),
            other => panic!("期望审计文件错误, 实际: {:?}", other),
        }
    }
}
