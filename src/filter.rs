//! Name filtering for file entries.

use crate::info::{FileInfo, FileType};

/// Ordered list of shell-style wildcard patterns, matched case-insensitively.
///
/// `*` matches any run of characters, `?` a single character. An empty
/// pattern list passes everything. Directories always pass so the tree stays
/// navigable while filtering; the verdict only drives whether an entry is
/// selectable, it never removes nodes.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    patterns: Vec<String>,
}

impl NameFilter {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, info: &FileInfo) -> bool {
        if self.patterns.is_empty() || info.file_type == FileType::Directory {
            return true;
        }

        self.patterns
            .iter()
            .any(|pattern| wildcard_match(pattern, &info.name))
    }
}

/// Case-insensitive `*`/`?` match, two pointers with backtracking to the
/// most recent star.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();

    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((sp, sn)) = star {
            p = sp + 1;
            n = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
