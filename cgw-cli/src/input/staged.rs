//! Staged push directories
//!
//! A staging root holds item lists under `<root>/<destination>/CGW/*.yaml`
//! and the files to publish anywhere else below the root. File items refer
//! to their payload through `pushItemPath` (relative to the root); the
//! payload's size and checksums are computed here and its content-addressed
//! `downloadURL` derived from the SHA-256.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use md5::Md5;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use super::schema::SchemaMode;
use super::yaml::read_documents;
use super::{InputError, parse_items};
use crate::sync::{CatalogItem, EntityKind};

const ITEM_DIR: &str = "CGW";
const PUSH_ITEM_PATH: &str = "pushItemPath";
const DOWNLOAD_PREFIX: &str = "/content/origin/files/sha256";

/// Size and digests of a staged payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDigest {
    pub size: u64,
    pub md5: String,
    pub sha256: String,
}

impl StagedDigest {
    pub fn download_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            DOWNLOAD_PREFIX,
            &self.sha256[..2],
            self.sha256,
            file_name
        )
    }
}

/// Item list files of a staging root, sorted by path
pub fn discover_item_files(root: &Path) -> Result<Vec<PathBuf>, InputError> {
    if !root.is_dir() {
        return Err(InputError::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let in_item_dir = path
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|dir| dir == ITEM_DIR);
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "yaml" | "yml"));
            in_item_dir && is_yaml
        })
        .collect();
    found.sort();
    Ok(found)
}

/// Stream a staged file through the digests
pub fn digest_file(path: &Path) -> std::io::Result<StagedDigest> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut md5 = Md5::new();
    let mut sha256 = Sha256::new();
    let mut size = 0u64;
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        md5.update(&buffer[..read]);
        sha256.update(&buffer[..read]);
        size += read as u64;
    }

    Ok(StagedDigest {
        size,
        md5: hex::encode(md5.finalize()),
        sha256: hex::encode(sha256.finalize()),
    })
}

/// Replace `pushItemPath` on file items with the staged payload's
/// `size`, `md5`, `sha256` and `downloadURL`
pub fn resolve_push_items(root: &Path, items: &mut [CatalogItem]) -> Result<(), InputError> {
    for (index, item) in items.iter_mut().enumerate() {
        if item.kind != EntityKind::File {
            continue;
        }
        let Some(relative) = item
            .metadata
            .get(PUSH_ITEM_PATH)
            .and_then(|v| v.as_str())
            .map(str::to_string)
        else {
            continue;
        };

        let path = root.join(relative.trim_start_matches('/'));
        let staged_error = |reason: String| InputError::StagedFile {
            index,
            path: path.clone(),
            reason,
        };
        if !path.starts_with(root) || relative.split('/').any(|part| part == "..") {
            return Err(staged_error("path escapes the staging root".into()));
        }
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| staged_error("path has no file name".into()))?
            .to_string();
        let digest = digest_file(&path).map_err(|e| staged_error(e.to_string()))?;

        log::debug!(
            "staged {} -> sha256 {} ({} bytes)",
            path.display(),
            digest.sha256,
            digest.size
        );
        item.metadata.remove(PUSH_ITEM_PATH);
        item.set_field("size", digest.size);
        item.set_field("md5", digest.md5.clone());
        item.set_field("sha256", digest.sha256.clone());
        item.set_field("downloadURL", digest.download_url(&file_name));
    }
    Ok(())
}

/// Load every item list of a staging root, resolving staged payloads
pub fn load_staged(root: &Path) -> Result<Vec<CatalogItem>, InputError> {
    let mut items = Vec::new();
    for path in discover_item_files(root)? {
        log::info!("reading staged item list {}", path.display());
        let mut batch = parse_items(read_documents(&path)?, SchemaMode::Staged)?;
        resolve_push_items(root, &mut batch)?;
        items.extend(batch);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    // sha256("hello\n")
    const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";
    const HELLO_MD5: &str = "b1946ac92492d2347c6235b4d2611184";

    fn staging_root() -> TempDir {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("dest/CGW")).unwrap();
        fs::create_dir_all(root.path().join("dest/FILES")).unwrap();
        fs::write(root.path().join("dest/FILES/hello.txt"), "hello\n").unwrap();
        fs::write(
            root.path().join("dest/CGW/items.yaml"),
            r#"
- product:
    name: X
    productCode: X1
    eloquaCode: E1
    releases:
      - versionName: v1
        termsAndConditions: T
        files:
          - pushItemPath: dest/FILES/hello.txt
            label: Hello
"#,
        )
        .unwrap();
        root
    }

    #[test]
    fn test_digest_file() {
        let root = staging_root();
        let digest = digest_file(&root.path().join("dest/FILES/hello.txt")).unwrap();
        assert_eq!(digest.size, 6);
        assert_eq!(digest.sha256, HELLO_SHA256);
        assert_eq!(digest.md5, HELLO_MD5);
        assert_eq!(
            digest.download_url("hello.txt"),
            format!("/content/origin/files/sha256/58/{}/hello.txt", HELLO_SHA256)
        );
    }

    #[test]
    fn test_discover_only_item_lists() {
        let root = staging_root();
        fs::write(root.path().join("dest/CGW/notes.txt"), "ignored").unwrap();
        fs::create_dir_all(root.path().join("other/CGW")).unwrap();
        fs::write(root.path().join("other/CGW/more.yml"), "[]").unwrap();

        let found = discover_item_files(root.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(root.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            [
                PathBuf::from("dest/CGW/items.yaml"),
                PathBuf::from("other/CGW/more.yml")
            ]
        );
    }

    #[test]
    fn test_load_staged_resolves_files() {
        let root = staging_root();
        let items = load_staged(root.path()).unwrap();

        assert_eq!(items.len(), 3);
        let file = &items[2];
        assert!(file.metadata.get("pushItemPath").is_none());
        assert_eq!(file.metadata["size"], json!(6));
        assert_eq!(file.metadata["sha256"], json!(HELLO_SHA256));
        assert_eq!(file.metadata["label"], json!("Hello"));
        assert_eq!(
            file.natural_key().unwrap().parts()[3],
            format!("/content/origin/files/sha256/58/{}/hello.txt", HELLO_SHA256)
        );
    }

    #[test]
    fn test_missing_staged_file() {
        let root = staging_root();
        fs::remove_file(root.path().join("dest/FILES/hello.txt")).unwrap();

        let err = load_staged(root.path()).unwrap_err();
        assert!(matches!(err, InputError::StagedFile { index: 2, .. }));
    }

    #[test]
    fn test_path_outside_root_is_rejected() {
        let root = staging_root();
        let mut items = vec![CatalogItem::new(
            EntityKind::File,
            crate::sync::types::Action::Create,
            json!({"pushItemPath": "../secret"}).as_object().cloned().unwrap(),
        )];

        let err = resolve_push_items(root.path(), &mut items).unwrap_err();
        assert!(err.to_string().contains("escapes the staging root"));
    }
}
