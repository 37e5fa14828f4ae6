use crate::syntax::SyntaxNode;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Byte-span replacement with before-text verification.
///
/// Every rewrite compiles down to a list of patches against one source text;
/// the rewrite engine only decides *which* spans to patch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a Patch does nothing until passed to apply_patches"]
pub struct Patch {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    pub new_text: String,
    pub expected_before: Verification,
}

/// What the patched span must contain before the patch applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    ExactMatch(String),
    /// xxh3 hash of the expected text
    Hash(u64),
}

impl Verification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Verification::ExactMatch(expected) => text == expected,
            Verification::Hash(expected) => xxh3_64(text.as_bytes()) == *expected,
        }
    }

    /// Exact text for spans up to 1 KiB, a hash above that.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            Verification::Hash(xxh3_64(text.as_bytes()))
        } else {
            Verification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error(
        "patches overlap: [{first_start}, {first_end}) `{first_text}` and \
         [{second_start}, {second_end}) `{second_text}`"
    )]
    Overlap {
        first_start: usize,
        first_end: usize,
        first_text: String,
        second_start: usize,
        second_end: usize,
        second_text: String,
    },

    #[error("before-text verification failed at [{byte_start}, {byte_end}): found `{found}`")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range [{byte_start}, {byte_end}) in text of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("byte offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("file content changed since it was read: {0}")]
    FileChanged(PathBuf),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Patch {
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: Verification::from_text(expected_before),
        }
    }

    /// Replace exactly the span of `node`.
    pub fn replace(node: SyntaxNode<'_>, new_text: impl Into<String>) -> Self {
        Self::new(node.start_offset(), node.end_offset(), new_text, node.text())
    }

    pub fn with_verification(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        verification: Verification,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: verification,
        }
    }

    /// True when applying the patch to `source` would not change it.
    pub fn is_noop(&self, source: &str) -> bool {
        source.get(self.byte_start..self.byte_end) == Some(self.new_text.as_str())
    }

    fn validate(&self, source: &str) -> Result<(), PatchError> {
        if self.byte_start > self.byte_end || self.byte_end > source.len() {
            return Err(PatchError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: source.len(),
            });
        }
        for offset in [self.byte_start, self.byte_end] {
            if !source.is_char_boundary(offset) {
                return Err(PatchError::NotCharBoundary { offset });
            }
        }

        let current = &source[self.byte_start..self.byte_end];
        if !self.expected_before.matches(current) {
            return Err(PatchError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }
        Ok(())
    }
}

/// Apply non-overlapping patches to `source`.
///
/// Patches are sorted by start offset and each must begin at or after the end
/// of the previous one; any overlap is an error and nothing is applied.
/// Application runs back to front so earlier offsets stay valid.
pub fn apply_patches(source: &str, mut patches: Vec<Patch>) -> Result<String, PatchError> {
    patches.sort_by_key(|p| (p.byte_start, p.byte_end));

    for patch in &patches {
        patch.validate(source)?;
    }
    for pair in patches.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.byte_start < prev.byte_end {
            return Err(PatchError::Overlap {
                first_start: prev.byte_start,
                first_end: prev.byte_end,
                first_text: source[prev.byte_start..prev.byte_end].to_string(),
                second_start: next.byte_start,
                second_end: next.byte_end,
                second_text: source[next.byte_start..next.byte_end].to_string(),
            });
        }
    }

    let mut output = source.to_string();
    for patch in patches.iter().rev() {
        output.replace_range(patch.byte_start..patch.byte_end, &patch.new_text);
    }
    Ok(output)
}

/// Whole-file replacement, verified against the content it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileRewrite does nothing until apply() is called"]
pub struct FileRewrite {
    pub path: PathBuf,
    pub expected_before: Verification,
    pub new_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written { path: PathBuf, bytes: usize },
    /// The file already had the new content.
    Unchanged { path: PathBuf },
}

impl FileRewrite {
    pub fn new(path: impl Into<PathBuf>, before: &str, new_content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected_before: Verification::from_text(before),
            new_content: new_content.into(),
        }
    }

    /// Write atomically (tempfile + fsync + rename) and bump the mtime.
    pub fn apply(&self) -> Result<FileOutcome, PatchError> {
        let current = fs::read_to_string(&self.path)?;
        if current == self.new_content {
            return Ok(FileOutcome::Unchanged {
                path: self.path.clone(),
            });
        }
        if !self.expected_before.matches(&current) {
            return Err(PatchError::FileChanged(self.path.clone()));
        }

        atomic_write(&self.path, self.new_content.as_bytes())?;
        filetime::set_file_mtime(&self.path, filetime::FileTime::now())?;

        Ok(FileOutcome::Written {
            path: self.path.clone(),
            bytes: self.new_content.len(),
        })
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PatchError> {
    // Same directory keeps the rename on one filesystem.
    let parent = path.parent().ok_or_else(|| {
        PatchError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn verification_exact_and_hash() {
        assert!(Verification::from_text("abc").matches("abc"));
        assert!(!Verification::from_text("abc").matches("abd"));

        let large = "x".repeat(2000);
        let verify = Verification::from_text(&large);
        assert!(matches!(verify, Verification::Hash(_)));
        assert!(verify.matches(&large));
    }

    #[test]
    fn applies_back_to_front() {
        let source = "foo(a, b)";
        let patches = vec![
            Patch::new(7, 8, "beta", "b"),
            Patch::new(0, 3, "bar", "foo"),
            Patch::new(4, 5, "alpha", "a"),
        ];
        assert_eq!(apply_patches(source, patches).unwrap(), "bar(alpha, beta)");
    }

    #[test]
    fn noop_detection() {
        let source = "foo(a)";
        assert!(Patch::new(4, 5, "a", "a").is_noop(source));
        assert!(!Patch::new(4, 5, "b", "a").is_noop(source));
        assert!(!Patch::new(4, 50, "a", "a").is_noop(source));
    }

    #[test]
    fn adjacent_patches_allowed() {
        let source = "abcdef";
        let patches = vec![Patch::new(0, 3, "X", "abc"), Patch::new(3, 6, "Y", "def")];
        assert_eq!(apply_patches(source, patches).unwrap(), "XY");
    }

    #[test]
    fn overlap_rejected() {
        let source = "abcdef";
        let patches = vec![Patch::new(0, 4, "X", "abcd"), Patch::new(2, 6, "Y", "cdef")];
        let err = apply_patches(source, patches).unwrap_err();
        match err {
            PatchError::Overlap {
                first_start,
                second_start,
                first_text,
                ..
            } => {
                assert_eq!(first_start, 0);
                assert_eq!(second_start, 2);
                assert_eq!(first_text, "abcd");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn verification_failure() {
        let err = apply_patches("abc", vec![Patch::new(0, 1, "z", "q")]).unwrap_err();
        assert!(matches!(err, PatchError::BeforeTextMismatch { .. }));
    }

    #[test]
    fn range_and_boundary_checks() {
        let err = apply_patches("abc", vec![Patch::new(2, 9, "z", "c")]).unwrap_err();
        assert!(matches!(err, PatchError::InvalidByteRange { .. }));

        let err = apply_patches("é", vec![Patch::new(1, 2, "z", "")]).unwrap_err();
        assert!(matches!(err, PatchError::NotCharBoundary { offset: 1 }));
    }

    #[test]
    fn file_rewrite_writes_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A.kt");
        fs::write(&path, "old").unwrap();

        let rewrite = FileRewrite::new(&path, "old", "new");
        assert_eq!(
            rewrite.apply().unwrap(),
            FileOutcome::Written {
                path: path.clone(),
                bytes: 3
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(
            rewrite.apply().unwrap(),
            FileOutcome::Unchanged { path: path.clone() }
        );
    }

    #[test]
    fn file_rewrite_detects_concurrent_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A.java");
        fs::write(&path, "changed").unwrap();

        let err = FileRewrite::new(&path, "original", "new").apply().unwrap_err();
        assert!(matches!(err, PatchError::FileChanged(_)));
    }
}
