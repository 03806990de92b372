// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "it";
pub const SUPPORTED_LANGS: [&str; 2] = ["it", "en"];

/// Dicionário de mensagens por idioma, carregado dos arquivos em `locales/`.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();

        for (lang, raw) in [
            ("it", include_str!("../../locales/it.json")),
            ("en", include_str!("../../locales/en.json")),
        ] {
            match serde_json::from_str::<HashMap<String, String>>(raw) {
                Ok(table) => {
                    messages.insert(lang.to_string(), table);
                }
                Err(e) => tracing::error!("Arquivo de tradução '{}' inválido: {}", lang, e),
            }
        }

        Self { messages: Arc::new(messages) }
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.messages.contains_key(lang)
    }

    // Idioma pedido -> idioma padrão -> a própria chave
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|table| table.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|table| table.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Como `translate`, substituindo `{nome}` pelos valores passados.
    pub fn translate_with(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        params
            .iter()
            .fold(self.translate(lang, key), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_italian_then_key() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate("de", "eligibility.outside_service_hours"),
            store.translate("it", "eligibility.outside_service_hours")
        );
        assert_eq!(store.translate("en", "no.such.key"), "no.such.key");
    }

    #[test]
    fn interpolates_named_params() {
        let store = I18nStore::new();
        let text = store.translate_with("en", "eligibility.past_deadline", &[("deadline", "12:00")]);
        assert_eq!(text, "Orders for this category close at 12:00.");
    }

    #[test]
    fn both_locales_define_the_same_keys() {
        let store = I18nStore::new();
        let it = store.messages.get("it").expect("it");
        let en = store.messages.get("en").expect("en");
        let mut it_keys: Vec<_> = it.keys().collect();
        let mut en_keys: Vec<_> = en.keys().collect();
        it_keys.sort();
        en_keys.sort();
        assert_eq!(it_keys, en_keys);
    }
}
