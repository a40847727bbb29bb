// i18n.rs — 界面文本的运行时本地化
//
// - 文本表：assets/i18n.json（格式：{ "<lang>": { "key": "value" } }）
// - 找不到文件时使用编译进程序的同一份表
// - 查找顺序：当前语言 -> en -> key 本身
// - tr("key") / tr_with("key", &[("name", ...)])，占位符写作 {name}

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use log::{debug, warn};
use once_cell::sync::OnceCell;

pub const FALLBACK_LANG: &str = "en";

const BUILTIN: &str = include_str!("../assets/i18n.json");

type Table = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
    languages: Vec<String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

/// <exe_dir>/assets/i18n.json, then ./assets/i18n.json.
fn find_table_file() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("i18n.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("i18n.json");
    p.exists().then_some(p)
}

fn load_table() -> Table {
    if let Some(path) = find_table_file() {
        match std::fs::read_to_string(&path).map(|t| serde_json::from_str::<Table>(&t)) {
            Ok(Ok(table)) => {
                debug!("i18n table loaded from {:?}", path);
                return table;
            }
            Ok(Err(e)) => warn!("i18n table {:?} unreadable: {}", path, e),
            Err(e) => warn!("i18n table {:?} unreadable: {}", path, e),
        }
    }
    serde_json::from_str(BUILTIN).unwrap_or_default()
}

impl I18n {
    pub fn from_table(mut table: Table, lang: &str) -> Self {
        let mut languages: Vec<String> = table.keys().cloned().collect();
        languages.sort();

        let fallback_map = table.get(FALLBACK_LANG).cloned().unwrap_or_default();
        let map = table.remove(lang).unwrap_or_else(|| {
            warn!("no strings for language `{}`, using `{}`", lang, FALLBACK_LANG);
            fallback_map.clone()
        });

        Self {
            lang: lang.to_string(),
            map,
            fallback_map,
            languages,
        }
    }

    pub fn get(&self, key: &str) -> String {
        self.map
            .get(key)
            .or_else(|| self.fallback_map.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }
}

/// Initialize global i18n. Later calls switch the current language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let i = I18n::from_table(load_table(), &lang);

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else {
        let _ = I18N.set(RwLock::new(i));
    }
}

fn get_locked() -> Option<std::sync::RwLockReadGuard<'static, I18n>> {
    I18N.get().and_then(|l| l.read().ok())
}

pub fn current_lang() -> String {
    get_locked()
        .map(|i| i.lang.clone())
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

pub fn languages() -> Vec<String> {
    get_locked().map(|i| i.languages.clone()).unwrap_or_default()
}

/// Localized text for `key`; the key itself when nothing matches.
pub fn tr(key: &str) -> String {
    match get_locked() {
        Some(i) => i.get(key),
        None => key.to_string(),
    }
}

/// Localized text with `{name}` placeholders substituted. Placeholders
/// without a value are kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    substitute(tr(key), args)
}

fn substitute(mut s: String, args: &[(&str, String)]) -> String {
    for (k, v) in args {
        s = s.replace(&format!("{{{}}}", k), v);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        serde_json::from_str(BUILTIN).unwrap()
    }

    #[test]
    fn test_builtin_table_covers_every_language() {
        let table = table();
        let en = &table[FALLBACK_LANG];
        for (lang, strings) in &table {
            for key in en.keys() {
                assert!(strings.contains_key(key), "`{}` missing in {}", key, lang);
            }
        }
    }

    #[test]
    fn test_missing_keys_fall_back() {
        let mut table = table();
        table.get_mut("fr").unwrap().remove("status.loading");
        let i = I18n::from_table(table.clone(), "fr");

        assert_eq!(i.get("status.loading"), table["en"]["status.loading"]);
        assert_eq!(i.get("no.such.key"), "no.such.key");
        assert!(i.languages().contains(&"zh-Hans".to_string()));
    }

    #[test]
    fn test_unknown_language_uses_fallback() {
        let i = I18n::from_table(table(), "xx");
        assert_eq!(i.get("app.title"), table()["en"]["app.title"]);
    }

    #[test]
    fn test_placeholders() {
        let s = substitute("{room} ({n})".to_string(), &[("room", "Salon".into())]);
        assert_eq!(s, "Salon ({n})");
    }
}
