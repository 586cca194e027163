use serde::{Deserialize, Serialize};

text_enum! {
    RevelationType, "revelation type" {
        Meccan => ("meccan", "Meccan"),
        Medinan => ("medinan", "Medinan"),
    }
}

text_enum! {
    FontType, "font type" {
        Uthmani => ("uthmani", "Uthmani"),
        Indopak => ("indopak", "Indo-Pak"),
        Naskh => ("naskh", "Naskh"),
    }
}

text_enum! {
    ReaderTheme, "reader theme" {
        Light => ("light", "Light"),
        Dark => ("dark", "Dark"),
        Sepia => ("sepia", "Sepia"),
    }
}

text_enum! {
    SearchIn, "search field" {
        Text => ("text", "Arabic text"),
        Translation => ("translation", "Translation"),
        Both => ("both", "Text and translation"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuranPart {
    pub part_number: u32,
    pub name: String,
    pub ayah_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surah {
    pub number: u32,
    pub name_arabic: String,
    pub name_english: String,
    pub revelation_type: RevelationType,
    pub verses_count: u32,
    pub revelation_order: u32,
}

impl Surah {
    /// Name in the configured display language, falling back to English.
    pub fn name_for(&self, language: &str) -> &str {
        if language.eq_ignore_ascii_case("ar") {
            &self.name_arabic
        } else {
            &self.name_english
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ayah {
    pub id: i64,
    pub surah_number: u32,
    pub ayah_number: u32,
    pub part_number: u32,
    pub text_uthmani: String,
    pub text_simple: Option<String>,
    pub translation: Option<String>,
    pub page: Option<u32>,
}

impl Ayah {
    pub fn reference(&self) -> String {
        format!("{}:{}", self.surah_number, self.ayah_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub user_id: i64,
    pub surah_number: u32,
    pub ayah_number: u32,
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSettings {
    pub user_id: i64,
    pub font_type: FontType,
    pub font_size: u32,
    pub theme: ReaderTheme,
    pub show_translation: bool,
    pub last_read_surah: Option<u32>,
    pub last_read_ayah: Option<u32>,
}

impl ReadingSettings {
    pub fn defaults_for(user_id: i64) -> Self {
        Self {
            user_id,
            font_type: FontType::Uthmani,
            font_size: 24,
            theme: ReaderTheme::Light,
            show_translation: true,
            last_read_surah: None,
            last_read_ayah: None,
        }
    }
}
