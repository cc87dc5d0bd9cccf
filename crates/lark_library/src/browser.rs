//! 目录浏览器

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::is_audio_file;

/// 浏览错误
#[derive(thiserror::Error, Debug)]
pub enum BrowseError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// 列表中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// 一次目录列举的结果。出错时 `entries` 为空、`error` 记录原因
#[derive(Debug, Default)]
pub struct Listing {
    pub root: PathBuf,
    pub entries: Vec<DirEntry>,
    pub error: Option<BrowseError>,
}

/// 列出目录：子目录在前，文件只保留音频扩展名，各组按名称排序（不区分大小写）。
/// 隐藏条目不显示。
pub fn list_entries(path: &Path) -> Listing {
    let mut listing = Listing {
        root: path.to_path_buf(),
        ..Default::default()
    };

    match read_entries(path) {
        Ok(entries) => listing.entries = entries,
        Err(e) => {
            log::warn!("{}", e);
            listing.error = Some(e);
        }
    }

    listing
}

fn read_entries(path: &Path) -> Result<Vec<DirEntry>, BrowseError> {
    let read_err = |source| BrowseError::Read {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(read_err)?;
    if !metadata.is_dir() {
        return Err(BrowseError::NotADirectory(path.to_path_buf()));
    }

    let mut entries = Vec::new();
    for item in fs::read_dir(path).map_err(read_err)? {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                log::debug!("skipping unreadable entry in {}: {}", path.display(), e);
                continue;
            }
        };

        let name = item.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        // 跟随符号链接
        let entry_path = item.path();
        let is_dir = entry_path.is_dir();
        if !is_dir && !is_audio_file(&entry_path) {
            continue;
        }

        entries.push(DirEntry {
            name,
            path: entry_path,
            is_dir,
        });
    }

    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(entries)
}

/// 激活条目的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// 进入了目录，列表已替换
    Descended,
    /// 请求播放该文件
    Play(PathBuf),
    /// 条目已不存在
    Ignored,
}

/// 目录浏览器
#[derive(Debug)]
pub struct DirectoryBrowser {
    listing: Listing,
}

impl DirectoryBrowser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            listing: list_entries(&root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.listing.root
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.listing.entries
    }

    pub fn error(&self) -> Option<&BrowseError> {
        self.listing.error.as_ref()
    }

    /// 以 `path` 为新的根目录重新列举
    pub fn load_directory(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        log::debug!("listing {}", path.display());
        self.listing = list_entries(&path);
    }

    pub fn refresh(&mut self) {
        let root = self.listing.root.clone();
        self.load_directory(root);
    }

    /// 返回上一级，已在顶层时返回 `false`
    pub fn go_up(&mut self) -> bool {
        match self.listing.root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                let parent = parent.to_path_buf();
                self.load_directory(parent);
                true
            }
            _ => false,
        }
    }

    /// 目录则进入，文件则请求播放
    pub fn activate(&mut self, entry: &DirEntry) -> Activation {
        if entry.is_dir {
            self.load_directory(entry.path.clone());
            Activation::Descended
        } else if entry.path.is_file() {
            log::info!("selected {}", entry.path.display());
            Activation::Play(entry.path.clone())
        } else {
            log::warn!("entry vanished: {}", entry.path.display());
            Activation::Ignored
        }
    }

    pub fn activate_index(&mut self, index: usize) -> Activation {
        match self.listing.entries.get(index).cloned() {
            Some(entry) => self.activate(&entry),
            None => Activation::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "lark-browser-{}-{}",
            tag,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&root).unwrap();
        root
    }

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_list_filters_and_orders() {
        let root = temp_root("list");
        fs::create_dir(root.join("zeta")).unwrap();
        fs::create_dir(root.join("Alpha")).unwrap();
        fs::create_dir(root.join(".cache")).unwrap();
        touch(&root.join("b.MP3"));
        touch(&root.join("a.flac"));
        touch(&root.join("cover.jpg"));
        touch(&root.join("notes.txt"));
        touch(&root.join(".hidden.mp3"));
        touch(&root.join("C.wma"));

        let listing = list_entries(&root);
        assert!(listing.error.is_none());
        assert_eq!(
            names(&listing.entries),
            vec!["Alpha", "zeta", "a.flac", "b.MP3", "C.wma"]
        );
        assert!(listing.entries[0].is_dir);
        assert!(!listing.entries[2].is_dir);
    }

    #[test]
    fn test_directories_shown_regardless_of_name() {
        let root = temp_root("dirs");
        fs::create_dir(root.join("album.jpg")).unwrap();
        let listing = list_entries(&root);
        assert_eq!(names(&listing.entries), vec!["album.jpg"]);
        assert!(listing.entries[0].is_dir);
    }

    #[test]
    fn test_missing_directory_is_empty_with_error() {
        let root = temp_root("missing").join("nope");
        let listing = list_entries(&root);
        assert!(listing.entries.is_empty());
        assert!(matches!(listing.error, Some(BrowseError::Read { .. })));

        let file = temp_root("file").join("a.mp3");
        touch(&file);
        let listing = list_entries(&file);
        assert!(listing.entries.is_empty());
        assert!(matches!(listing.error, Some(BrowseError::NotADirectory(_))));
    }

    #[test]
    fn test_activate_descends_and_plays() {
        let root = temp_root("activate");
        fs::create_dir(root.join("album")).unwrap();
        touch(&root.join("album").join("01.ogg"));
        touch(&root.join("single.wav"));

        let mut browser = DirectoryBrowser::new(&root);
        assert_eq!(names(browser.entries()), vec!["album", "single.wav"]);

        assert_eq!(
            browser.activate_index(1),
            Activation::Play(root.join("single.wav"))
        );
        assert_eq!(browser.root(), root.as_path());

        assert_eq!(browser.activate_index(0), Activation::Descended);
        assert_eq!(browser.root(), root.join("album").as_path());
        assert_eq!(names(browser.entries()), vec!["01.ogg"]);

        assert!(browser.go_up());
        assert_eq!(browser.root(), root.as_path());
        assert_eq!(browser.activate_index(99), Activation::Ignored);
    }

    #[test]
    fn test_activate_vanished_file() {
        let root = temp_root("vanish");
        touch(&root.join("gone.mp3"));
        let mut browser = DirectoryBrowser::new(&root);
        fs::remove_file(root.join("gone.mp3")).unwrap();
        assert_eq!(browser.activate_index(0), Activation::Ignored);
    }
}
