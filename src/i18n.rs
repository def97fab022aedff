//! Display strings for the supported languages.
//!
//! Tables are `'static` and shared by the whole process.

use serde::{Deserialize, Serialize};

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Arabic (right-to-left).
    Ar,
    /// French.
    Fr,
}

impl Language {
    /// Every supported language, in switcher order.
    pub const ALL: [Language; 3] = [Language::En, Language::Ar, Language::Fr];

    /// Returns the language tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
            Self::Fr => "fr",
        }
    }

    /// Whether text in this language runs right-to-left.
    pub fn is_rtl(&self) -> bool {
        matches!(self, Self::Ar)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a tag outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language tag: {0} (expected one of en, ar, fr)")]
pub struct UnknownLanguage(pub String);

impl std::str::FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ar" => Ok(Self::Ar),
            "fr" => Ok(Self::Fr),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

/// The fixed set of UI strings for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Strings {
    /// Application title.
    pub title: &'static str,
    /// Heading of the edit controls.
    pub controls: &'static str,
    /// Upload step label.
    pub upload: &'static str,
    /// Prompt step label.
    pub prompt: &'static str,
    /// Edit button label.
    pub magic_edit: &'static str,
    /// History section heading.
    pub history: &'static str,
    /// Caption of the source image.
    pub source: &'static str,
    /// Caption of the result image.
    pub result: &'static str,
    /// Prompt placeholder text.
    pub placeholder: &'static str,
    /// Upload area hint.
    pub drop: &'static str,
    /// Replace-image action.
    pub change: &'static str,
    /// Shown when nothing is loaded.
    pub no_image: &'static str,
    /// Explains how to start.
    pub no_image_sub: &'static str,
    /// Tips heading.
    pub tips: &'static str,
    /// First tip.
    pub tip1: &'static str,
    /// Second tip.
    pub tip2: &'static str,
    /// Third tip.
    pub tip3: &'static str,
    /// Shown after an upload.
    pub success: &'static str,
}

impl Strings {
    /// Key/text pairs in display order.
    pub fn entries(&self) -> [(&'static str, &'static str); 18] {
        [
            ("title", self.title),
            ("controls", self.controls),
            ("upload", self.upload),
            ("prompt", self.prompt),
            ("magic_edit", self.magic_edit),
            ("history", self.history),
            ("source", self.source),
            ("result", self.result),
            ("placeholder", self.placeholder),
            ("drop", self.drop),
            ("change", self.change),
            ("no_image", self.no_image),
            ("no_image_sub", self.no_image_sub),
            ("tips", self.tips),
            ("tip1", self.tip1),
            ("tip2", self.tip2),
            ("tip3", self.tip3),
            ("success", self.success),
        ]
    }
}

static EN: Strings = Strings {
    title: "IMAGINE WITH ABDO",
    controls: "Edit Controls",
    upload: "1. Upload Image",
    prompt: "2. Tell Gemini what to do",
    magic_edit: "Magic Edit",
    history: "Generation History",
    source: "Source",
    result: "Result",
    placeholder: "e.g., Make a girl wear these shoes on a beach...",
    drop: "Drop image or click to browse",
    change: "Change Photo",
    no_image: "No Image Loaded",
    no_image_sub: "Upload a photo to begin the styling magic.",
    tips: "Styling Tips",
    tip1: "Be specific about environment",
    tip2: "Mention styles: 'retro', 'cinematic'",
    tip3: "Add subjects: 'put a cute cat next to it'",
    success: "Image Loaded",
};

static AR: Strings = Strings {
    title: "تخيّل مع عبدو",
    controls: "أدوات التعديل",
    upload: "١. رفع صورة",
    prompt: "٢. أخبر جمناي ماذا يفعل",
    magic_edit: "تعديل سحري",
    history: "سجل الأجيال",
    source: "الأصل",
    result: "النتيجة",
    placeholder: "مثال: اجعل فتاة ترتدي هذا الحذاء على الشاطئ...",
    drop: "اسحب الصورة أو انقر للتصفح",
    change: "تغيير الصورة",
    no_image: "لم يتم تحميل أي صورة",
    no_image_sub: "ارفع صورة لبدء السحر.",
    tips: "نصائح التنسيق",
    tip1: "كن دقيقاً بشأن البيئة",
    tip2: "اذكر الأنماط: 'سينمائي' ، 'كلاسيكي'",
    tip3: "أضف عناصر: 'ضع قطة لطيفة بجانبها'",
    success: "تم تحميل الصورة",
};

static FR: Strings = Strings {
    title: "IMAGINE WITH ABDO",
    controls: "Contrôles d'édition",
    upload: "1. Charger une image",
    prompt: "2. Dites à Gemini quoi faire",
    magic_edit: "Édition Magique",
    history: "Historique",
    source: "Source",
    result: "Résultat",
    placeholder: "ex: Faites porter ces chaussures à une fille sur une plage...",
    drop: "Déposez une image ou cliquez pour parcourir",
    change: "Changer la photo",
    no_image: "Aucune image chargée",
    no_image_sub: "Téléchargez une photo pour commencer la magie.",
    tips: "Conseils",
    tip1: "Soyez précis sur l'environnement",
    tip2: "Mentionnez les styles : 'rétro', 'cinématique'",
    tip3: "Ajoutez des sujets : 'mettez un chat mignon à côté'",
    success: "Image chargée",
};

/// Returns the UI strings for `language`.
pub fn strings_for(language: Language) -> &'static Strings {
    match language {
        Language::En => &EN,
        Language::Ar => &AR,
        Language::Fr => &FR,
    }
}

/// Returns the instruction a fresh prompt starts with in `language`.
pub fn default_prompt_for(language: Language) -> &'static str {
    match language {
        Language::En => "Make a girl wear this",
        Language::Ar => "اجعل فتاة ترتدي هذا",
        Language::Fr => "Faites porter cela à une fille",
    }
}
