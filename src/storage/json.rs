use super::traits::{MetadataStore, PersistError, PersistResult};
use crate::state::TokenMap;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the result set as a pretty-printed JSON object
///
/// The document maps each lowercase contract address to
/// `{"Name", "Symbol", "ContractAddress"}`, indented with tabs and ordered by
/// address. The file is replaced atomically: the document is written to a
/// sibling temporary file which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a previously written document back
    pub fn load(&self) -> PersistResult<TokenMap> {
        let content = fs::read_to_string(&self.path).map_err(|source| PersistError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "metadata.json".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl MetadataStore for JsonFileStore {
    fn save(&mut self, tokens: &TokenMap) -> PersistResult<()> {
        let document = to_pretty_json(tokens)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let temp_path = self.temp_path();
        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(&document)?;
            file.sync_all()
        });

        if let Err(e) = written.and_then(|()| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.write_error(e));
        }

        tracing::info!(
            "Wrote metadata for {} tokens to {}",
            tokens.len(),
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serializes with tab indentation and a trailing newline
fn to_pretty_json(tokens: &TokenMap) -> PersistResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    tokens.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenMetadata;
    use tempfile::TempDir;

    fn sample() -> TokenMap {
        let mut tokens = TokenMap::new();
        for token in [
            TokenMetadata::new("Tether USD", "USDT", "0xDAC17F958D2ee523a2206206994597C13D831ec7"),
            TokenMetadata::new("Chainlink", "LINK", "0x514910771AF9Ca656af840dff83E8264EcF986CA"),
        ] {
            tokens.insert(token.contract_address().to_string(), token);
        }
        tokens
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("tokenMetadata.json"));

        store.save(&sample()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_document_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokenMetadata.json");
        let mut store = JsonFileStore::new(&path);

        store.save(&sample()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let entry = &value["0xdac17f958d2ee523a2206206994597c13d831ec7"];

        assert_eq!(entry["Name"], "Tether USD");
        assert_eq!(entry["Symbol"], "USDT");
        assert_eq!(
            entry["ContractAddress"],
            "0xdac17f958d2ee523a2206206994597c13d831ec7"
        );
        assert!(content.contains("\n\t\"0x514910771af9ca656af840dff83e8264ecf986ca\": {"));
        // keys are ordered
        assert!(content.find("0x5149").unwrap() < content.find("0xdac1").unwrap());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resources").join("nested").join("tokens.json");
        let mut store = JsonFileStore::new(&path);

        store.save(&TokenMap::new()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn test_overwrites_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "stale content that is much longer than the new document").unwrap();

        let mut store = JsonFileStore::new(&path);
        store.save(&TokenMap::new()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
        // no temp file left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        // the target's parent is a regular file
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut store = JsonFileStore::new(blocker.join("tokens.json"));

        let err = store.save(&sample()).unwrap_err();
        assert!(matches!(err, PersistError::Write { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing.json"));
        assert!(matches!(store.load(), Err(PersistError::Read { .. })));
    }
}
