//! Filename-derived defaults for content files.
//!
//! Every source file gets a few variables before its front matter is read:
//! a guessed title and the URL its output will be published under. Both are
//! pure functions of the root-relative path.
//!
//! ## Titles
//!
//! The file stem is split on `-` and `_`, and each word is capitalised:
//! - `my-first_post.md` → "My First Post"
//! - `blog/2024-recap.md` → "2024 Recap"
//! - `about.md` → "About"
//!
//! ## URLs
//!
//! The extension is replaced with `.html` (appended if there is none) and
//! separators are always `/`, so `blog/post.md` → `blog/post.html`.

use crate::paths::slash_path;
use std::path::{Path, PathBuf};

/// Guess a display title from a file name.
pub fn guess_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    stem.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace the extension of `path` with `ext`, or append it if there is none.
pub fn rename_ext(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// The published URL of a root-relative source path.
pub fn url_for(rel: &Path) -> String {
    slash_path(&rename_ext(rel, "html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_from_dashed_name() {
        assert_eq!(guess_title(Path::new("my-first-post.md")), "My First Post");
    }

    #[test]
    fn title_from_underscored_name() {
        assert_eq!(guess_title(Path::new("hello_world.html")), "Hello World");
    }

    #[test]
    fn title_ignores_directories() {
        assert_eq!(guess_title(Path::new("blog/2024-recap.md")), "2024 Recap");
    }

    #[test]
    fn title_collapses_repeated_separators() {
        assert_eq!(guess_title(Path::new("a--b__c.md")), "A B C");
    }

    #[test]
    fn title_keeps_inner_case() {
        assert_eq!(guess_title(Path::new("iPhone-tips.md")), "IPhone Tips");
    }

    #[test]
    fn title_of_extensionless_file() {
        assert_eq!(guess_title(Path::new("README")), "README");
    }

    #[test]
    fn rename_replaces_extension() {
        assert_eq!(
            rename_ext(Path::new("blog/post.md"), "html"),
            PathBuf::from("blog/post.html")
        );
    }

    #[test]
    fn rename_appends_when_missing() {
        assert_eq!(
            rename_ext(Path::new("notes"), "html"),
            PathBuf::from("notes.html")
        );
    }

    #[test]
    fn url_uses_forward_slashes() {
        assert_eq!(url_for(Path::new("blog/post.md")), "blog/post.html");
        assert_eq!(url_for(Path::new("index.mkd")), "index.html");
    }
}
