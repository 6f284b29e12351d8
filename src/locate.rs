//! Pattern-based discovery of files in directory trees and archives.
//!
//! A [`SearchPattern`] pairs a compiled regex or glob with a tag. Every
//! path that matches yields a [`Match`] carrying that tag, so one traversal
//! can classify files into several kinds at once (for example `*.jar` as
//! [`Packaging::Jar`](crate::Packaging::Jar) and `*.war` as
//! [`Packaging::War`](crate::Packaging::War)).
//!
//! Paths are always tested in `/`-separated form relative to the search
//! root. Results are sets; callers must not rely on traversal order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::fs::ArchiveFs;
use crate::{Error, Result};

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Glob(glob::Pattern),
}

impl Matcher {
    fn as_str(&self) -> &str {
        match self {
            Matcher::Regex(regex) => regex.as_str(),
            Matcher::Glob(pattern) => pattern.as_str(),
        }
    }
}

/// A compiled path pattern and the tag reported for paths it matches.
#[derive(Debug, Clone)]
pub struct SearchPattern<T> {
    matcher: Matcher,
    tag: T,
}

impl<T> SearchPattern<T> {
    /// Compiles a regular expression matched against relative paths.
    ///
    /// The expression is not anchored; use `^`/`$` as needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the expression does not compile.
    pub fn new(regex: &str, tag: T) -> Result<Self> {
        let regex = Regex::new(regex).map_err(|e| Error::InvalidPattern {
            pattern: regex.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            matcher: Matcher::Regex(regex),
            tag,
        })
    }

    /// Builds a pattern from a shell glob such as `lib/*.jar` or `**/*.war`.
    ///
    /// The whole path must match. `*` and `?` stay within one path
    /// segment, `**` spans segments.
    ///
    /// ```
    /// use persistence_patcher::locate::SearchPattern;
    ///
    /// let pattern = SearchPattern::glob("**/*.jar", ()).unwrap();
    /// assert!(pattern.is_match("lib/model.jar"));
    /// assert!(pattern.is_match("model.jar"));
    /// assert!(!pattern.is_match("lib/model.war"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the glob is malformed.
    pub fn glob(expr: &str, tag: T) -> Result<Self> {
        let pattern = glob::Pattern::new(expr).map_err(|e| Error::InvalidPattern {
            pattern: expr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            matcher: Matcher::Glob(pattern),
            tag,
        })
    }

    /// Returns the tag reported for matches.
    pub fn tag(&self) -> &T {
        &self.tag
    }

    /// Returns true if the `/`-separated path matches.
    pub fn is_match(&self, path: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(regex) => regex.is_match(path),
            Matcher::Glob(pattern) => pattern.matches_with(path, GLOB_OPTIONS),
        }
    }
}

const GLOB_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A located file: its path and the tag of the first pattern it matched.
///
/// For [`find_in_dir`] the path is a real file path below the search root;
/// for [`find_in_archive`] it is a normalized entry path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Match<T> {
    /// Location of the file.
    pub path: PathBuf,
    /// Tag of the matching pattern.
    pub tag: T,
}

/// Finds every regular file below `root` whose relative path matches a pattern.
///
/// Symbolic links are not followed. Each file appears at most once; when
/// several patterns match, the first one in `patterns` wins.
///
/// # Errors
///
/// Returns [`Error::NotADirectory`] if `root` is not a directory, or an
/// I/O error if part of the tree cannot be read.
pub fn find_in_dir<T>(root: impl AsRef<Path>, patterns: &[SearchPattern<T>]) -> Result<BTreeSet<Match<T>>>
where
    T: Clone + Ord,
{
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::NotADirectory {
            path: root.display().to_string(),
        });
    }

    let mut found = BTreeSet::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::file_op("walk", path, std::io::Error::from(e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = to_slash_path(relative);
        if let Some(pattern) = first_match(patterns, &relative) {
            log::trace!("'{}' matched {:?}", relative, pattern.matcher.as_str());
            found.insert(Match {
                path: entry.into_path(),
                tag: pattern.tag.clone(),
            });
        }
    }

    log::debug!("Found {} matching files below '{}'", found.len(), root.display());
    Ok(found)
}

/// Finds every file entry of an open archive whose path matches a pattern.
pub fn find_in_archive<T>(archive: &ArchiveFs, patterns: &[SearchPattern<T>]) -> BTreeSet<Match<T>>
where
    T: Clone + Ord,
{
    archive
        .files()
        .filter_map(|entry| {
            first_match(patterns, entry.as_str()).map(|pattern| Match {
                path: PathBuf::from(entry.as_str()),
                tag: pattern.tag.clone(),
            })
        })
        .collect()
}

fn first_match<'a, T>(patterns: &'a [SearchPattern<T>], path: &str) -> Option<&'a SearchPattern<T>> {
    patterns.iter().find(|p| p.is_match(path))
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Kind {
        Jar,
        War,
        Any,
    }

    fn patterns() -> Vec<SearchPattern<Kind>> {
        vec![
            SearchPattern::new(r"\.jar$", Kind::Jar).unwrap(),
            SearchPattern::new(r"\.war$", Kind::War).unwrap(),
            SearchPattern::new(r".*", Kind::Any).unwrap(),
        ]
    }

    #[test]
    fn test_invalid_regex() {
        let err = SearchPattern::new("(unclosed", Kind::Jar).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_invalid_glob() {
        let err = SearchPattern::glob("lib/[", Kind::Jar).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_glob_matching() {
        let lib = SearchPattern::glob("lib/*.jar", Kind::Jar).unwrap();
        assert!(lib.is_match("lib/a.jar"));
        assert!(!lib.is_match("lib/nested/a.jar"));
        assert!(!lib.is_match("xlib/a.jar"));

        let any = SearchPattern::glob("**/*.war", Kind::War).unwrap();
        assert!(any.is_match("web.war"));
        assert!(any.is_match("deep/er/web.war"));

        let class = SearchPattern::glob("[!x]?.jar", Kind::Jar).unwrap();
        assert!(class.is_match("ab.jar"));
        assert!(!class.is_match("xb.jar"));

        // `^` is a literal inside a glob class, not a negation
        let caret = SearchPattern::glob("[^x].jar", Kind::Jar).unwrap();
        assert!(caret.is_match("^.jar"));
        assert!(caret.is_match("x.jar"));
        assert!(!caret.is_match("a.jar"));
    }

    #[test]
    fn test_find_in_dir_first_pattern_wins() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("lib")).unwrap();
        std::fs::write(temp.path().join("lib/model.jar"), b"").unwrap();
        std::fs::write(temp.path().join("web.war"), b"").unwrap();
        std::fs::write(temp.path().join("readme.txt"), b"").unwrap();

        let found = find_in_dir(temp.path(), &patterns()).unwrap();
        assert_eq!(found.len(), 3);

        let jar = found
            .iter()
            .find(|m| m.path.ends_with("lib/model.jar"))
            .unwrap();
        assert_eq!(jar.tag, Kind::Jar);
        let war = found.iter().find(|m| m.path.ends_with("web.war")).unwrap();
        assert_eq!(war.tag, Kind::War);
        let txt = found.iter().find(|m| m.path.ends_with("readme.txt")).unwrap();
        assert_eq!(txt.tag, Kind::Any);
    }

    #[test]
    fn test_find_in_dir_ignores_directories() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("looks-like.jar")).unwrap();
        let found = find_in_dir(temp.path(), &patterns()[..1]).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_find_in_dir_requires_directory() {
        let temp = TempDir::new().unwrap();
        let err = find_in_dir(temp.path().join("missing"), &patterns()).unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }

    #[test]
    fn test_matches_are_relative_to_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("x.jar.d");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("notes.txt"), b"").unwrap();

        // The root's own name must not leak into the tested path
        let unanchored = [SearchPattern::new("jar", Kind::Jar).unwrap()];
        let found = find_in_dir(&root, &unanchored).unwrap();
        assert!(found.is_empty());
    }
}
