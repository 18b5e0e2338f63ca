//! Locale keyword tables
//!
//! Keywords are written already folded (lowercase, no diacritics). A trailing
//! `*` turns a keyword into a prefix stem, which covers Romanian inflection
//! without a stemmer. Multi-word keywords match as whole-token phrases.

use std::collections::HashSet;

/// Keyword families for one language
#[derive(Debug)]
pub struct KeywordTables {
    pub language: &'static str,
    pub interrupt: &'static [&'static str],
    pub list: &'static [&'static str],
    pub narrative: &'static [&'static str],
    pub explanatory: &'static [&'static str],
    pub pain: &'static [&'static str],
    pub transformation: &'static [&'static str],
    pub desire: &'static [&'static str],
    pub cta_comment: &'static [&'static str],
    pub cta_save: &'static [&'static str],
    pub cta_share: &'static [&'static str],
    pub cta_follow: &'static [&'static str],
    pub cta_click: &'static [&'static str],
    pub emotion: &'static [&'static str],
}

pub static ENGLISH: KeywordTables = KeywordTables {
    language: "en",
    interrupt: &[
        "stop", "wait", "warning", "attention", "listen", "unpopular opinion", "hot take",
        "secret", "shocking", "nobody tells", "breaking", "truth",
    ],
    list: &[
        "ways", "tips", "steps", "reasons", "things", "top", "checklist", "habits", "rules",
        "ideas", "lessons", "mistakes",
    ],
    narrative: &[
        "story", "when i", "i remember", "yesterday", "last year", "years ago", "once upon",
        "journey", "my first", "happened",
    ],
    explanatory: &[
        "how to", "why", "what is", "guide", "learn", "explained", "tutorial", "here s how",
        "understand", "the science",
    ],
    pain: &[
        "problem*", "struggl*", "pain", "frustrat*", "tired of", "mistake*", "wrong", "fail*",
        "stuck", "worry", "costly", "avoid",
    ],
    transformation: &[
        "before", "after", "transform*", "imagine", "used to", "now i", "result*", "changed",
    ],
    desire: &[
        "discover", "exclusive", "limited", "offer", "get yours", "today only", "want",
        "attention", "act now",
    ],
    cta_comment: &[
        "comment*", "tell me", "let me know", "share your thoughts", "reply", "what do you think",
        "drop a",
    ],
    cta_save: &["save", "save this", "bookmark", "keep this"],
    cta_share: &["share", "tag a friend", "tag someone", "send this", "repost"],
    cta_follow: &["follow", "subscribe", "turn on notifications", "join us"],
    cta_click: &[
        "click", "link in bio", "tap the link", "sign up", "book", "register", "dm us",
        "send us a message", "visit", "buy", "call us", "learn more",
    ],
    emotion: &[
        "love", "amazing", "incredible", "finally", "proud", "fear", "afraid", "happy",
        "excited", "heartbreaking", "grateful", "frustrat*", "surpris*", "shock*",
    ],
};

pub static ROMANIAN: KeywordTables = KeywordTables {
    language: "ro",
    interrupt: &[
        "stop", "atentie", "opreste*", "nimeni", "secret*", "adevarul", "avertisment",
        "socant*",
    ],
    list: &[
        "moduri", "sfaturi", "pasi", "motive", "lucruri", "top", "lista", "reguli", "idei",
        "greseli",
    ],
    narrative: &[
        "poveste*", "cand am", "imi amintesc", "ieri", "anul trecut", "acum cativa ani",
        "odata", "calatori*", "prima mea", "prima data",
    ],
    explanatory: &[
        "cum sa", "de ce", "ce este", "ghid*", "afla", "explic*", "invata", "intelege",
    ],
    pain: &[
        "problem*", "greseal*", "gresit*", "durere", "dureri", "frustr*", "obosit*", "blocat*",
        "esec*", "evita", "costisitor", "griji",
    ],
    transformation: &[
        "inainte", "dupa", "transform*", "imagineaza*", "rezultat*", "schimbat*",
    ],
    desire: &[
        "descopera", "exclusiv*", "limitat*", "oferta", "doar azi", "vrei",
    ],
    cta_comment: &[
        "comenteaza", "comentari*", "spune mi", "spuneti ne", "ce parere", "raspunde*",
    ],
    cta_save: &["salveaza", "pastreaza"],
    cta_share: &["distribuie", "trimite", "eticheteaza", "da mai departe"],
    cta_follow: &["urmareste*", "aboneaza*", "alatura"],
    cta_click: &[
        "click", "link in bio", "programeaza*", "rezerva", "suna", "scrie ne", "inscrie*",
        "acceseaza", "viziteaza", "cumpara",
    ],
    emotion: &[
        "iubesc", "minunat*", "incredibil*", "in sfarsit", "mandru", "mandra", "frica",
        "fericit*", "entuziasmat*", "recunoscator", "surprin*", "socant*",
    ],
};

/// Lowercase and strip Romanian diacritics
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'ă' | 'â' | 'á' | 'à' | 'ä' => 'a',
            'î' | 'í' => 'i',
            'ș' | 'ş' => 's',
            'ț' | 'ţ' => 't',
            'é' | 'è' | 'ë' => 'e',
            'ó' | 'ö' => 'o',
            'ú' | 'ü' => 'u',
            '’' | '\'' => ' ',
            other => other,
        })
        .collect()
}

/// Split folded text into alphanumeric tokens
pub fn tokenize(folded: &str) -> Vec<String> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Text prepared once for repeated keyword lookups
pub struct NormalizedText {
    tokens: Vec<String>,
    token_set: HashSet<String>,
    padded: String,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        let tokens = tokenize(&fold(text));
        let padded = format!(" {} ", tokens.join(" "));
        let token_set = tokens.iter().cloned().collect();
        Self { tokens, token_set, padded }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether a single keyword (stem, word or phrase) occurs
    pub fn contains(&self, keyword: &str) -> bool {
        if let Some(stem) = keyword.strip_suffix('*') {
            let stem = stem.trim();
            if stem.contains(' ') {
                return self.padded.contains(&format!(" {}", stem));
            }
            return self.tokens.iter().any(|t| t.starts_with(stem));
        }

        let parts = tokenize(keyword);
        match parts.len() {
            0 => false,
            1 => self.token_set.contains(&parts[0]),
            _ => self.padded.contains(&format!(" {} ", parts.join(" "))),
        }
    }

    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.contains(k))
    }

    pub fn count_matches(&self, keywords: &[&str]) -> usize {
        keywords.iter().filter(|k| self.contains(k)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_diacritics() {
        assert_eq!(fold("Greșeală În Țară"), "greseala in tara");
    }

    #[test]
    fn test_stem_and_phrase_matching() {
        let text = NormalizedText::new("Cele mai mari greșeli pe care le-am făcut. Spune-mi!");
        assert!(text.contains("greseal*") || text.contains("greseli"));
        assert!(text.contains("spune mi"));
        assert!(!text.contains("cumpara"));
    }

    #[test]
    fn test_single_word_does_not_match_substring() {
        let text = NormalizedText::new("This is topical");
        assert!(!text.contains("top"));
    }
}
