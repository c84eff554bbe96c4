//! On-disk path cache persistence.
//!
//! The cache format is a small hand-rolled, length-framed binary
//! layout — deliberately not `serde`/`bincode`/any general-purpose
//! serialization crate, per the cache-format design note carried over
//! from the specification this resolver implements. A cache file is a
//! sequence of per-drive records:
//!
//! ```text
//! magic:        4 bytes  "PCH1"
//! record*:
//!   drive_len:  u8
//!   drive:      drive_len bytes (ASCII drive letter/name)
//!   node:       recursive node encoding
//! node:
//!   name_len:   u16 LE
//!   name:       name_len bytes (UTF-8)
//!   record_no:  u64 LE
//!   child_count:u32 LE
//!   child*:     node
//! ```

use crate::domain::entities::PathCacheNode;
use crate::domain::repositories::{PathCacheStore, PathCacheStoreError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"PCH1";

pub struct LocalPathCacheStore;

impl LocalPathCacheStore {
    pub fn new() -> Self {
        Self
    }

    fn read_all_drives(path: &Path) -> Result<BTreeMap<String, PathCacheNode>, PathCacheStoreError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        cursor
            .read_exact(&mut magic)
            .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;
        if &magic != MAGIC {
            return Err(PathCacheStoreError::Corrupt(
                "bad magic in path cache file".to_string(),
            ));
        }

        let mut drives = BTreeMap::new();
        while (cursor.position() as usize) < cursor.get_ref().len() {
            let drive_len = cursor
                .read_u8()
                .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;
            let mut drive_bytes = vec![0u8; drive_len as usize];
            cursor
                .read_exact(&mut drive_bytes)
                .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;
            let drive = String::from_utf8(drive_bytes)
                .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;

            let node = Self::read_node(&mut cursor)?;
            drives.insert(drive, node);
        }

        Ok(drives)
    }

    fn read_node(cursor: &mut Cursor<Vec<u8>>) -> Result<PathCacheNode, PathCacheStoreError> {
        let name_len = cursor
            .read_u16::<LittleEndian>()
            .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;
        let mut name_bytes = vec![0u8; name_len as usize];
        cursor
            .read_exact(&mut name_bytes)
            .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;
        let name = String::from_utf8(name_bytes)
            .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;

        let record_number = cursor
            .read_u64::<LittleEndian>()
            .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;

        let child_count = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| PathCacheStoreError::Corrupt(e.to_string()))?;

        let mut children = Vec::with_capacity(child_count as usize);
        for _ in 0..child_count {
            children.push(Self::read_node(cursor)?);
        }

        Ok(PathCacheNode::from_parts(name, record_number, children))
    }

    fn write_node(out: &mut Vec<u8>, node: &PathCacheNode) -> Result<(), PathCacheStoreError> {
        let name_bytes = node.name().as_bytes();
        out.write_u16::<LittleEndian>(name_bytes.len() as u16)
            .map_err(PathCacheStoreError::Io)?;
        out.extend_from_slice(name_bytes);
        out.write_u64::<LittleEndian>(node.record_number())
            .map_err(PathCacheStoreError::Io)?;

        let children: Vec<&PathCacheNode> = node.children().collect();
        out.write_u32::<LittleEndian>(children.len() as u32)
            .map_err(PathCacheStoreError::Io)?;
        for child in children {
            Self::write_node(out, child)?;
        }
        Ok(())
    }
}

impl Default for LocalPathCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PathCacheStore for LocalPathCacheStore {
    fn load(&self, path: &Path, drive: &str) -> Result<PathCacheNode, PathCacheStoreError> {
        let drives = Self::read_all_drives(path)?;
        Ok(drives
            .get(&drive.to_lowercase())
            .cloned()
            .unwrap_or_else(PathCacheNode::new_root))
    }

    fn save(
        &self,
        path: &Path,
        drive: &str,
        tree: &PathCacheNode,
    ) -> Result<(), PathCacheStoreError> {
        let mut drives = Self::read_all_drives(path)?;
        drives.insert(drive.to_lowercase(), tree.clone());

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        for (drive, node) in &drives {
            out.write_u8(drive.len() as u8).map_err(PathCacheStoreError::Io)?;
            out.extend_from_slice(drive.as_bytes());
            Self::write_node(&mut out, node)?;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(&out)?;
        Ok(())
    }
}
