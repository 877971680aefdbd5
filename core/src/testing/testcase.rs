use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use lazy_regex::regex_captures;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No such testcase dir '{0}'")]
    NoSuchDir(PathBuf),

    #[error("Cannot read dir '{0}': {1}")]
    ReadDir(PathBuf, #[source] io::Error),

    #[error("Failed to read testcase '{0}': {1}")]
    ReadFile(PathBuf, #[source] io::Error),
}

/// One input / expected-output pair.
#[async_trait]
pub trait AsyncTestcase: Send + Sync {
    /// 1-based position in discovery order.
    fn index(&self) -> usize;
    fn name(&self) -> &str;
    async fn load_input(&self) -> Result<String>;
    async fn load_expected(&self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsTestcase {
    index: usize,
    name: String,
    input_path: PathBuf,
    expected_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnMemoryTestcase {
    pub index: usize,
    pub name: String,
    pub input: String,
    pub expected: String,
}

/// An `input<N>` file whose `output<N>` counterpart is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryWarning {
    pub input_path: PathBuf,
    pub expected_path: PathBuf,
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} not found for {}",
            self.expected_path.to_string_lossy(),
            self.input_path.to_string_lossy()
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub testcases: Vec<FsTestcase>,
    pub warnings: Vec<DiscoveryWarning>,
}

impl FsTestcase {
    pub fn new(
        index: usize,
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        expected: impl Into<PathBuf>,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            input_path: input.into(),
            expected_path: expected.into(),
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn expected_path(&self) -> &Path {
        &self.expected_path
    }

    /// Finds `input<N>.<ext>` / `output<N>.<ext>` pairs in `dir`, ordered by ascending N.
    pub fn enumerate(dir: impl AsRef<Path>) -> Result<Discovery> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::NoSuchDir(dir.to_owned()));
        }
        let entries = std::fs::read_dir(dir).map_err(|e| Error::ReadDir(dir.to_owned(), e))?;

        let mut pairs = Vec::new();
        let mut warnings = Vec::new();
        for entry in entries.filter_map(std::result::Result::ok) {
            let Ok(ft) = entry.file_type() else {
                continue
            };
            if ft.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some((num, digits, ext)) = file_name.to_str().and_then(parse_input_filename) else {
                continue
            };

            let input_path = entry.path();
            let expected_path = dir.join(format!("output{}.{}", digits, ext));
            if expected_path.is_file() {
                pairs.push((num, input_path, expected_path));
            } else {
                let w = DiscoveryWarning {
                    input_path,
                    expected_path,
                };
                log::warn!("{}", w);
                warnings.push(w);
            }
        }

        pairs.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        warnings.sort_by(|a, b| a.input_path.cmp(&b.input_path));

        let testcases = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (_, input, expected))| {
                let name = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Self::new(i + 1, name, input, expected)
            })
            .collect();

        Ok(Discovery {
            testcases,
            warnings,
        })
    }
}

/// `"input12.txt"` -> `(12, "12", "txt")`
fn parse_input_filename(name: &str) -> Option<(u64, &str, &str)> {
    let (_, digits, ext) = regex_captures!(r"^input(\d+)\.([^.]+)$", name)?;
    let num = digits.parse().ok()?;
    Some((num, digits, ext))
}

async fn read_testcase_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::ReadFile(path.to_owned(), e))
}

#[async_trait]
impl AsyncTestcase for FsTestcase {
    fn index(&self) -> usize {
        self.index
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn load_input(&self) -> Result<String> {
        read_testcase_file(&self.input_path).await
    }

    async fn load_expected(&self) -> Result<String> {
        read_testcase_file(&self.expected_path).await
    }
}

impl OnMemoryTestcase {
    pub fn new(
        index: usize,
        name: impl Into<String>,
        input: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            input: input.into(),
            expected: expected.into(),
        }
    }
}

#[async_trait]
impl AsyncTestcase for OnMemoryTestcase {
    fn index(&self) -> usize {
        self.index
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn load_input(&self) -> Result<String> {
        Ok(self.input.clone())
    }

    async fn load_expected(&self) -> Result<String> {
        Ok(self.expected.clone())
    }
}
