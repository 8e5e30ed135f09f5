use std::{
    env::temp_dir,
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

use log::{debug, warn};

use super::{
    common::rng_str,
    error::{MrError, MrResult},
};

/// A file removed again when the handle drops. Used for config fixtures.
#[derive(Debug)]
pub struct TempFile {
    pub filepath: PathBuf,
}

impl TempFile {
    pub fn new<P: Into<PathBuf>>(filepath: P) -> MrResult<TempFile> {
        let filepath = filepath.into();
        match File::create(&filepath) {
            Ok(_) => Ok(TempFile { filepath }),
            Err(e) => Err(MrError::RawError(e)),
        }
    }

    pub fn in_dir(dir: &str, ext: &str) -> MrResult<TempFile> {
        let filepath = PathBuf::from(dir).join(format!("{}.{}", rng_str(12), ext));
        debug!("temp filepath created: {:?}", &filepath);
        TempFile::new(filepath)
    }

    pub fn in_tmp_dir(ext: &str) -> MrResult<TempFile> {
        let filepath = temp_dir().join(format!("{}.{}", rng_str(12), ext));
        TempFile::new(filepath)
    }

    pub fn write_str(&self, contents: &str) -> MrResult<()> {
        let mut file = File::create(&self.filepath)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    pub fn read_to_string(&self) -> MrResult<String> {
        Ok(fs::read_to_string(&self.filepath)?)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.filepath) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to delete TempFile {:?}: {:?}", &self.filepath, e);
            }
        }
    }
}
