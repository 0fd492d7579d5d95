use std::path::PathBuf;

pub fn default_root() -> PathBuf {
    PathBuf::from(".")
}

pub fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

pub fn default_host() -> String {
    "localhost".to_string()
}

pub fn default_port() -> u16 {
    5173
}

pub fn default_debounce_ms() -> u64 {
    100
}
