use crate::core::Source;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads a `.csv.gz` already present on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Source for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::info!("Reading CSV file from {}", self.path.display());
        let data = tokio::fs::read(&self.path).await?;
        Ok(data)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_file_contents() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"\x1f\x8bpayload").unwrap();

        let source = FileSource::new(file.path());
        let data = tokio_test::block_on(source.fetch()).unwrap();

        assert_eq!(data, b"\x1f\x8bpayload".to_vec());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = FileSource::new("/definitely/not/here.csv.gz");
        let err = tokio_test::block_on(source.fetch()).unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }
}
