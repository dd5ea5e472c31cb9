//! Guest module loading

use std::path::{Path, PathBuf};

use crate::domain::ProfileError;

/// A guest module read into memory
#[derive(Debug, Clone)]
pub struct GuestModule {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl GuestModule {
    /// Read the module file
    ///
    /// # Errors
    /// Returns [`ProfileError::ModuleLoad`] if the file can't be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| ProfileError::ModuleLoad { path: path.to_path_buf(), source })?;
        log::debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self { path: path.to_path_buf(), bytes })
    }

    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self { path: path.into(), bytes }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Name the guest sees as its `argv[0]`
    #[must_use]
    pub fn program_name(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_reads_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\0asm\x01\0\0\0").unwrap();

        let module = GuestModule::load(file.path()).unwrap();
        assert_eq!(module.bytes(), b"\0asm\x01\0\0\0");
        assert_eq!(module.path(), file.path());
    }

    #[test]
    fn test_load_missing_file() {
        let err = GuestModule::load("/nonexistent/module.wasm").unwrap_err();
        assert!(matches!(err, ProfileError::ModuleLoad { .. }));
        assert!(err.to_string().contains("/nonexistent/module.wasm"));
    }
}
