use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// What the in-memory source does when the decoder asks for more bytes than
/// are left in the buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShortRead {
    /// Report end of input; the decoder fails on truncated data
    #[default]
    Fail,
    /// Pad the request with zero bytes and keep going. Older embedded
    /// resources were produced against a loader that did this.
    ZeroFill,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub short_read: ShortRead,
    // Decoder working memory cap in bytes
    pub max_bytes: usize,
    // Skip chunk CRC and zlib Adler-32 verification
    pub ignore_checksums: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            short_read: ShortRead::Fail,
            max_bytes: 64 * 1024 * 1024,
            ignore_checksums: false,
        }
    }
}

impl DecodeOptions {
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        fs::read_to_string(path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
    }

    /// Write the options to the user config file, returning its path
    pub fn save(&self) -> io::Result<PathBuf> {
        let config_path = Self::config_path()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    fn config_path() -> Option<PathBuf> {
        #[allow(deprecated)]
        let home = std::env::home_dir()?;
        Some(home.join(".config").join("pixload").join("config.json"))
    }

    pub(crate) fn limits(&self) -> png::Limits {
        png::Limits {
            bytes: self.max_bytes,
        }
    }
}

#[test]
fn partial_config_falls_back_to_defaults() {
    let options: DecodeOptions = serde_json::from_str(r#"{ "short_read": "ZeroFill" }"#).unwrap();

    assert_eq!(options.short_read, ShortRead::ZeroFill);
    assert_eq!(options.max_bytes, DecodeOptions::default().max_bytes);
    assert!(!options.ignore_checksums);
}

#[test]
fn saved_options_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixload").join("config.json");
    assert_eq!(DecodeOptions::load_from(&path), None);

    let options = DecodeOptions {
        short_read: ShortRead::ZeroFill,
        max_bytes: 1024,
        ignore_checksums: true,
    };
    options.save_to(&path).unwrap();

    assert_eq!(DecodeOptions::load_from(&path), Some(options));
}
