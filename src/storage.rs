//! Safe local persistence: selector paths are projected onto short,
//! portable filenames before anything touches the disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::gopher;

/// Longest allowed basename, chosen to stay portable across filesystems.
const MAX_NAME_LEN: usize = 63;
/// Hex characters of the SHA-256 tag appended to truncated names.
const HASH_TAG_LEN: usize = 8;

/// Project an arbitrary resource path onto a collision-resistant,
/// length-bounded filename.
///
/// Characters outside `[A-Za-z0-9.-]` become `_`, which leaves pure
/// ASCII and keeps remote selectors from ever naming a parent directory.
/// Names longer than 63 bytes are truncated and tagged with the first 8
/// hex characters of `SHA-256(full_path)`, keeping the extension so the
/// file stays recognizable.
pub fn sanitize_name(full_path: &str) -> String {
    let safe: String = full_path
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.len() <= MAX_NAME_LEN {
        return safe;
    }

    let (stem, ext) = match safe.rfind('.') {
        Some(dot) => safe.split_at(dot),
        None => (safe.as_str(), ""),
    };
    let digest = Sha256::digest(full_path.as_bytes());
    let tag = format!("{:x}", digest);
    let tag = &tag[..HASH_TAG_LEN];
    let room = MAX_NAME_LEN.saturating_sub(HASH_TAG_LEN + ext.len());
    let keep = stem.len().min(room);
    format!("{}{}{}", &stem[..keep], tag, ext)
}

/// The on-disk location for a resource under the download root.
pub fn sanitized_path(root: &Path, full_path: &str) -> PathBuf {
    root.join(sanitize_name(full_path))
}

/// Persist a type-0 body, minus the end-of-text marker if the server
/// included one. Returns the on-disk size, or 0 after logging when the
/// write failed.
pub fn write_text(root: &Path, full_path: &str, body: &str) -> u64 {
    write_payload(root, full_path, gopher::strip_terminator(body).as_bytes())
}

/// Persist a binary payload byte-exact. Same size-or-zero contract as
/// [`write_text`].
pub fn write_binary(root: &Path, full_path: &str, payload: &[u8]) -> u64 {
    write_payload(root, full_path, payload)
}

fn write_payload(root: &Path, full_path: &str, payload: &[u8]) -> u64 {
    match try_write(root, full_path, payload) {
        Ok(size) => size,
        Err(err) => {
            log::error!("writing {:?} under {:?}: {}", full_path, root, err);
            0
        }
    }
}

fn try_write(root: &Path, full_path: &str, payload: &[u8]) -> io::Result<u64> {
    fs::create_dir_all(root)?;
    fs::write(sanitized_path(root, full_path), payload)?;
    Ok(payload.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn short_safe_names_pass_through() {
        assert_eq!(sanitize_name("hello.txt"), "hello.txt");
        assert_eq!(sanitize_name("a-b.c"), "a-b.c");
    }

    #[test]
    fn unsafe_characters_become_underscores() {
        assert_eq!(sanitize_name("/docs/read me!.txt"), "_docs_read_me_.txt");
        assert_eq!(sanitize_name("a\tb\\c"), "a_b_c");
    }

    #[test]
    fn sixty_three_chars_kept_verbatim() {
        let name = "a".repeat(63);
        assert_eq!(sanitize_name(&name), name);
    }

    #[test]
    fn sixty_four_chars_get_hash_tag() {
        let name = format!("{}.txt", "a".repeat(60));
        let safe = sanitize_name(&name);
        assert_eq!(safe.len(), 63);
        assert!(safe.ends_with(".txt"));
        assert_ne!(safe, name);
        assert!(safe
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-_".contains(c)));
    }

    #[test]
    fn long_names_without_extension_are_tagged_too() {
        let name = "b".repeat(200);
        let safe = sanitize_name(&name);
        assert_eq!(safe.len(), 63);
        assert!(safe.starts_with(&"b".repeat(55)));
    }

    #[test]
    fn distinct_long_paths_get_distinct_names() {
        let a = format!("/deep/{}/a.bin", "x".repeat(100));
        let b = format!("/deep/{}/b.bin", "x".repeat(100));
        assert_ne!(sanitize_name(&a), sanitize_name(&b));
    }

    #[test]
    fn sanitizing_is_a_projection() {
        for path in ["hello.txt", "/some selector/with spaces", &"q".repeat(90)] {
            let once = sanitize_name(path);
            assert_eq!(sanitize_name(&once), once);
        }
    }

    #[test]
    fn text_write_strips_terminator() {
        let dir = TempDir::new().unwrap();
        let size = write_text(dir.path(), "hello.txt", "hi.");
        assert_eq!(size, 2);
        let on_disk = fs::read_to_string(dir.path().join("hello.txt")).unwrap();
        assert_eq!(on_disk, "hi");
    }

    #[test]
    fn binary_write_is_byte_exact() {
        let dir = TempDir::new().unwrap();
        let payload: Vec<u8> = (0..=255).collect();
        let size = write_binary(dir.path(), "blob.bin", &payload);
        assert_eq!(size, 256);
        assert_eq!(fs::read(dir.path().join("blob.bin")).unwrap(), payload);
    }

    #[test]
    fn missing_root_is_created() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("downloads");
        assert_eq!(write_text(&root, "a.txt", "abc"), 3);
        assert!(root.join("a.txt").is_file());
    }

    #[test]
    fn failed_write_reports_zero() {
        let dir = TempDir::new().unwrap();
        // occupy the root path with a plain file so create_dir_all fails
        let root = dir.path().join("blocked");
        fs::write(&root, b"not a directory").unwrap();
        assert_eq!(write_text(&root, "a.txt", "abc"), 0);
    }
}
