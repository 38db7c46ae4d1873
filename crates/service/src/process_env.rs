use std::fs;
use std::path::{Path, PathBuf};

const ENV_CANDIDATES: [&str; 2] = ["oneonone.env", ".env"];

pub(crate) fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn strip_inline_comment(value: &str) -> &str {
    // Only treat ` #` as comment start (common dotenv behavior).
    let Some(pos) = value.find(" #") else {
        return value;
    };
    value[..pos].trim_end()
}

fn parse_dotenv_kv(line: &str) -> Option<(String, String)> {
    let mut line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
        return None;
    }
    if let Some(rest) = line.strip_prefix("export ") {
        line = rest.trim();
    }
    let (key, raw_value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let mut value = raw_value.trim();
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        value = &value[1..value.len() - 1];
    } else {
        value = strip_inline_comment(value);
    }
    Some((key.to_string(), value.to_string()))
}

fn find_env_file_in_dir(dir: &Path) -> Option<PathBuf> {
    ENV_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Applies `KEY=value` lines from the first env file found in `dir`.
/// Variables already present in the process environment win.
pub(crate) fn load_env_from_dir(dir: &Path) -> usize {
    let Some(path) = find_env_file_in_dir(dir) else {
        return 0;
    };
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("event=env_file_unreadable path={} err={}", path.display(), err);
            return 0;
        }
    };

    let mut applied = 0usize;
    for (key, value) in text.lines().filter_map(parse_dotenv_kv) {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(key, value);
        applied += 1;
    }

    if applied > 0 {
        // 中文注释：只记录数量和路径，不打印具体值（里面可能有 GEMINI_API_KEY）。
        log::info!("event=env_file_loaded count={} path={}", applied, path.display());
    }
    applied
}

pub(crate) fn load_env_from_exe_dir() {
    load_env_from_dir(&exe_dir());
}
