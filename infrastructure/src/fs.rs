//! Small filesystem helpers shared by the file-backed stores.

use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Write `content` to `path` through a temporary sibling file, so readers
/// never see a partial record. `dir` is created when missing.
pub(crate) async fn write_atomic(dir: &Path, path: &Path, stem: &str, content: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let tmp_path = dir.join(format!(".{}.{}.tmp", stem, uuid::Uuid::new_v4().simple()));

    let write_result = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if write_result.is_err() {
        let _ = tokio::fs::remove_file(&tmp_path).await;
    }
    write_result
}
