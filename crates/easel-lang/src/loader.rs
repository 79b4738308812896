use std::collections::HashMap;
use std::path::PathBuf;

/// Fetches sketch resources by the path the script names. `None` is the
/// failed-load sentinel; it is never an error.
pub trait ResourceLoader {
    fn load(&self, path: &str) -> Option<Vec<u8>>;

    fn load_text(&self, path: &str) -> Option<String> {
        self.load(path).map(|b| String::from_utf8_lossy(&b).into_owned())
    }
}

/// Resolves relative paths under a root directory.
pub struct FsLoader {
    pub root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for FsLoader {
    fn load(&self, path: &str) -> Option<Vec<u8>> {
        let full = self.root.join(path);
        match std::fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("could not load {}: {e}", full.display());
                None
            }
        }
    }
}

/// In-memory resources, for tests and embedding hosts.
#[derive(Default)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), bytes.into());
        self
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let loader = FsLoader::new("/nonexistent-easel-root");
        assert!(loader.load("nothing.png").is_none());
    }

    #[test]
    fn memory_loader_serves_text() {
        let loader = MemoryLoader::new().with("a.txt", "one\ntwo");
        assert_eq!(loader.load_text("a.txt").as_deref(), Some("one\ntwo"));
    }
}
