//! Caller language codes translated into each vendor's vocabulary.
//!
//! Lookups are case-insensitive and treat `_` and `-` alike. Codes a table does
//! not know are sent to the vendor unchanged.

/// Explicit mapping from normalized caller codes to vendor codes.
pub struct LanguageTable {
    entries: &'static [(&'static str, &'static str)],
}

impl LanguageTable {
    pub fn vendor_code(&self, code: &str) -> String {
        let key = code.trim().to_ascii_lowercase().replace('_', "-");
        self.entries
            .iter()
            .find(|(caller, _)| *caller == key)
            .map(|(_, vendor)| vendor.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}

/// AssemblyAI uses `en_us` style regional codes.
pub const ASSEMBLYAI: LanguageTable = LanguageTable {
    entries: &[
        ("en", "en"),
        ("en-us", "en_us"),
        ("en-gb", "en_uk"),
        ("en-uk", "en_uk"),
        ("en-au", "en_au"),
        ("es", "es"),
        ("es-es", "es"),
        ("es-mx", "es"),
        ("fr", "fr"),
        ("fr-fr", "fr"),
        ("fr-ca", "fr"),
        ("de", "de"),
        ("de-de", "de"),
        ("it", "it"),
        ("pt", "pt"),
        ("pt-br", "pt"),
        ("pt-pt", "pt"),
        ("nl", "nl"),
        ("hi", "hi"),
        ("ja", "ja"),
        ("zh", "zh"),
        ("zh-cn", "zh"),
        ("ko", "ko"),
        ("ru", "ru"),
        ("tr", "tr"),
        ("uk", "uk"),
        ("vi", "vi"),
        ("pl", "pl"),
        ("fi", "fi"),
    ],
};

/// Gladia only accepts ISO 639-1 base codes.
pub const GLADIA: LanguageTable = LanguageTable {
    entries: &[
        ("en-us", "en"),
        ("en-gb", "en"),
        ("en-uk", "en"),
        ("en-au", "en"),
        ("es-es", "es"),
        ("es-mx", "es"),
        ("fr-fr", "fr"),
        ("fr-ca", "fr"),
        ("de-de", "de"),
        ("pt-br", "pt"),
        ("pt-pt", "pt"),
        ("zh-cn", "zh"),
        ("zh-tw", "zh"),
    ],
};

/// Deepgram takes BCP-47 tags with an upper-case region.
pub const DEEPGRAM: LanguageTable = LanguageTable {
    entries: &[
        ("en-us", "en-US"),
        ("en-gb", "en-GB"),
        ("en-uk", "en-GB"),
        ("en-au", "en-AU"),
        ("en-in", "en-IN"),
        ("en-nz", "en-NZ"),
        ("es-419", "es-419"),
        ("fr-ca", "fr-CA"),
        ("pt-br", "pt-BR"),
        ("pt-pt", "pt-PT"),
        ("zh-cn", "zh-CN"),
        ("zh-tw", "zh-TW"),
        ("de-ch", "de-CH"),
        ("nl-be", "nl-BE"),
    ],
};
