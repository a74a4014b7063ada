use std::path::PathBuf;

/// Builder-side configuration: where artifacts land and what gets emitted.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub output_dir: PathBuf,
    pub emit_extended: bool,
    pub extra_stopwords: Vec<String>,
    /// Worker threads for the per-record tokenization fan-out. `None` defaults
    /// to `num_cpus::get()` at build time.
    pub tokenize_threads: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            output_dir: PathBuf::from("./index"),
            emit_extended: true,
            extra_stopwords: Vec::new(),
            tokenize_threads: None,
        }
    }
}

/// Query-side configuration: where to load artifacts from and default
/// search behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub artifact_root: PathBuf,
    pub default_limit: usize,
    pub eager_load_extended: bool,
    /// Must match the `BuildConfig::extra_stopwords` used to build the
    /// artifacts at `artifact_root`: words listed here are dropped from
    /// query tokens as no-op filler the same way they were dropped from
    /// indexed text, instead of resolving to zero term ids.
    pub extra_stopwords: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            artifact_root: PathBuf::from("./index"),
            default_limit: 50,
            eager_load_extended: false,
            extra_stopwords: Vec::new(),
        }
    }
}
