use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
#[allow(dead_code)]
pub struct TempFileManager {
    base_dir: PathBuf,
}

#[allow(dead_code)]
impl TempFileManager {
    pub fn new() -> Result<Self, String> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format!("clock: {}", e))?
            .as_millis();
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let base = PathBuf::from("target").join(format!(
            "defuse_{}_{}_{}",
            std::process::id(),
            ts,
            unique
        ));
        fs::create_dir_all(&base).map_err(|e| format!("create_dir_all: {}", e))?;
        Ok(Self { base_dir: base })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn create_directory<P: AsRef<Path>>(&self, name: P) -> Result<PathBuf, String> {
        let p = self.base_dir.join(name);
        fs::create_dir_all(&p).map_err(|e| format!("create_dir_all: {}", e))?;
        Ok(p)
    }

    pub fn create_file<P: AsRef<Path>>(&self, name: P, content: &str) -> Result<PathBuf, String> {
        let p = self.base_dir.join(name);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("parent dir: {}", e))?;
        }
        let mut f = File::create(&p).map_err(|e| format!("create: {}", e))?;
        f.write_all(content.as_bytes())
            .map_err(|e| format!("write: {}", e))?;
        Ok(p)
    }
}

impl Drop for TempFileManager {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.base_dir);
    }
}
