//! Static language tables: profession translations and assistant names.

use rand::seq::IndexedRandom;
use std::str::FromStr;

/// Languages with built-in translation and naming tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Finnish,
    Spanish,
    German,
}

impl Language {
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Finnish => "Finnish",
            Language::Spanish => "Spanish",
            Language::German => "German",
        }
    }

    /// Assistant display names offered for this language.
    pub fn assistant_names(&self) -> &'static [&'static str] {
        match self {
            Language::English => &["Alex", "Jordan", "Taylor", "Casey", "Sam"],
            Language::Finnish => &["Jari", "Lauri", "Satu", "Elias", "Aino"],
            Language::Spanish => &["Elena", "Carlos", "Sofia", "Mateo", "Isabella"],
            Language::German => &["Anna", "Max", "Lena", "Felix", "Clara"],
        }
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" => Ok(Language::English),
            "finnish" => Ok(Language::Finnish),
            "spanish" => Ok(Language::Spanish),
            "german" => Ok(Language::German),
            _ => Err(()),
        }
    }
}

/// Professions with built-in translations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profession {
    Computing,
    Construction,
    Healthcare,
}

impl Profession {
    pub fn translate(&self, language: Language) -> &'static str {
        use Language::*;
        use Profession::*;
        match (self, language) {
            (Computing, English) => "computing",
            (Construction, English) => "construction",
            (Healthcare, English) => "healthcare",
            (Computing, Finnish) => "tietojenkäsittely",
            (Construction, Finnish) => "rakennusala",
            (Healthcare, Finnish) => "terveydenhuolto",
            (Computing, Spanish) => "computación",
            (Construction, Spanish) => "construcción",
            (Healthcare, Spanish) => "cuidado de la salud",
            (Computing, German) => "rechnen",
            (Construction, German) => "konstruktion",
            (Healthcare, German) => "gesundheitspflege",
        }
    }
}

impl FromStr for Profession {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "computing" => Ok(Profession::Computing),
            "construction" => Ok(Profession::Construction),
            "healthcare" => Ok(Profession::Healthcare),
            _ => Err(()),
        }
    }
}

/// A profession as it should appear in a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfessionLabel<'a> {
    /// Found in the translation table.
    Translated(&'static str),
    /// No translation known; the caller's text is used as-is.
    Untranslated(&'a str),
}

impl<'a> ProfessionLabel<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            ProfessionLabel::Translated(s) => s,
            ProfessionLabel::Untranslated(s) => s,
        }
    }
}

/// Looks up `profession` in the translation table for `language`.
pub fn localize_profession<'a>(language: &str, profession: &'a str) -> ProfessionLabel<'a> {
    match (language.parse::<Language>(), profession.parse::<Profession>()) {
        (Ok(language), Ok(profession)) => ProfessionLabel::Translated(profession.translate(language)),
        _ => ProfessionLabel::Untranslated(profession),
    }
}

/// Picks a random assistant name for `language`, using the English pool for
/// languages without their own.
pub fn random_assistant_name(language: &str) -> &'static str {
    let names = language
        .parse::<Language>()
        .unwrap_or(Language::English)
        .assistant_names();
    names.choose(&mut rand::rng()).copied().unwrap_or("Alex")
}
