//! Prompt construction for instruction-tuned anonymizers
//!
//! Renders the Llama-2 chat format and picks the instruction for each prompt
//! bucket. Buckets look like `B-ZD-Med-01`: Z/F/C for zero-shot, few-shot and
//! chain-of-thought, D/I for the identifier class, then the domain.

/// System line placed inside `<<SYS>>`
pub const SYSTEM_PROMPT: &str =
    "Esi paslaugus asistentas – anonimizuok visus tiesioginius ir netiesioginius identifikatorius.";

/// Medical zero-shot instruction, also the fallback
pub const INSTR_MED: &str = "Anonimizuokite visus tiesioginius ir netiesioginius identifikatorius, \
galinčius padėti atskleisti paciento tapatybę.";

/// Legal few-shot instruction
pub const INSTR_LEG: &str = "Remdamiesi žemiau pateiktais anonimizavimo pavyzdžiais, \
anonimizuokite asmens duomenis pateiktame tekste.";

/// Government chain-of-thought instruction
pub const INSTR_GOV: &str = "Pirmiausia atpažinkite pateiktame tekste esančius tiesioginius ir \
netiesioginius identifikatorius pagal žemiau pateiktą žymeklių sąrašą, tada anonimizuokite \
tekstą, pakeisdami kiekvieną identifikatorių atitinkamu žymekliu.";

/// Worked examples prepended to legal inputs
const LEGAL_EXAMPLES: &str = "1. \"Advokatė Lina iš Šilalės konsultuoja vietos gyventojus \
paveldėjimo klausimais. Ji neseniai padėjo parengti skundo projektą, susijusį su testamento \
galiojimu.\" → \"[Profesija] [Vardas] iš [Miestas] konsultuoja [Šeimyninė_informacija] \
[Dokumentas]. Ji neseniai padėjo parengti [Dokumentas], susijusį su [Dokumentas] galiojimu.\"\n\
2. \"Savivaldybės teisininkas Andrius Juknevičius prieš mėnesį pateikė skundą administraciniam \
teismui. Jis atstovavo vienai iš statybų bendrovių ir ginčijo sklypo paskirties pakeitimą. \
Pateikti dokumentai buvo analizuojami tris savaites.\" → \"[Profesija] [Vardas_Pavardė] prieš \
[Laikotarpis] pateikė skundą [Įstaiga]. Jis atstovavo vienai iš [Įstaiga] ir ginčijo \
[Dokumentas]. Pateikti [Dokumentas] buvo analizuojami tris [Laikotarpis].\"\n\n";

const INST_CLOSE: &str = "[/INST]";

/// Prompting strategy selected from a bucket label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    MedicalZeroShot,
    LegalFewShot,
    GovernmentChainOfThought,
}

impl PromptKind {
    /// Unknown or missing buckets fall back to the medical instruction
    pub fn from_bucket(bucket: &str) -> Self {
        const LEGAL: [&str; 2] = ["B-FD-Leg", "B-FI-Leg"];
        const GOV: [&str; 2] = ["B-CD-Gov", "B-CI-Gov"];

        if LEGAL.iter().any(|p| bucket.starts_with(p)) {
            Self::LegalFewShot
        } else if GOV.iter().any(|p| bucket.starts_with(p)) {
            Self::GovernmentChainOfThought
        } else {
            Self::MedicalZeroShot
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Self::MedicalZeroShot => INSTR_MED,
            Self::LegalFewShot => INSTR_LEG,
            Self::GovernmentChainOfThought => INSTR_GOV,
        }
    }
}

/// Instruction and input text for one example
pub fn prepare_input(bucket: &str, raw: &str) -> (&'static str, String) {
    let kind = PromptKind::from_bucket(bucket);
    let input = match kind {
        PromptKind::LegalFewShot => format!("{LEGAL_EXAMPLES}Dabar anonimizuokite: \"{raw}\""),
        _ => raw.to_string(),
    };
    (kind.instruction(), input)
}

/// Llama-2 `[INST]` prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn render(&self, instruction: &str, input_text: &str) -> String {
        format!(
            "[INST] <<SYS>>\n{}\n<</SYS>>\n{}\n{} {}\n",
            self.system, instruction, input_text, INST_CLOSE
        )
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(SYSTEM_PROMPT)
    }
}

/// Strip an echoed prompt: keep what follows the last `[/INST]`, trimmed
pub fn extract_response(decoded: &str) -> &str {
    decoded
        .rsplit_once(INST_CLOSE)
        .map_or(decoded, |(_, answer)| answer)
        .trim()
}
