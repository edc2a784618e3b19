//! Lexical signals read straight from the raw text
//!
//! These run on the user's utterance (anger meter) and on the agent's reply
//! (goodbye detection), independently of what the classifier decided.

#![allow(clippy::expect_used)]

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PROFANITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(fuck\w*|shit\w*|bullshit|damn\w*|goddamn\w*|bitch\w*|bastard\w*|ass(?:hole)?s?|crap\w*|piss(?:ed)?|wtf|stfu|hell no)\b",
    )
    .expect("profanity pattern")
});

static INSULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(you(?:'re|\s+are)\s+(?:so\s+|such\s+an?\s+|an?\s+)?(?:idiot|stupid|moron|useless|pathetic|dumb|worthless|incompetent|clown|loser|joke)|shut\s+up|screw\s+you|go\s+to\s+hell|nobody\s+(?:asked|cares)|get\s+lost|idiot|moron|stupid\s+(?:bot|machine|thing))\b",
    )
    .expect("insult pattern")
});

static SHOUTED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{3,}\b").expect("shouting pattern"));

static REPEATED_EXCLAMATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!{3,}").expect("exclamation pattern"));

static APOLOGY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(sorry|apologi[sz]e|apologies|my\s+bad|forgive\s+me|i\s+was\s+wrong|didn'?t\s+mean\s+(?:it|to)|my\s+fault)\b",
    )
    .expect("apology pattern")
});

static CALM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(calm\s+down|relax|take\s+it\s+easy|no\s+worries|it'?s\s+(?:ok|okay|fine|alright)|thank(?:s|\s+you)|please|let'?s\s+(?:talk|start\s+over|be\s+friends)|i\s+understand|appreciate)\b",
    )
    .expect("calm pattern")
});

static GOODBYE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(goodbye|good\s+bye|bye(?:\s+bye)?|farewell|see\s+you\s+(?:later|soon|around)|i'?m\s+(?:leaving|out\s+of\s+here|done\s+(?:talking|with\s+you))|walks?\s+away|this\s+conversation\s+is\s+over)\b",
    )
    .expect("goodbye pattern")
});

/// Shouting needs at least this many all-caps words
const SHOUTED_WORDS_REQUIRED: usize = 2;

/// Emotion labels that count as anger
pub const ANGER_EMOTIONS: &[&str] = &[
    "anger",
    "angry",
    "frustration",
    "frustrated",
    "irritation",
    "irritated",
    "rage",
    "annoyance",
    "annoyed",
];

/// Emotion labels in the happiness family
pub const HAPPY_EMOTIONS: &[&str] = &[
    "happiness",
    "happy",
    "joy",
    "excitement",
    "excited",
    "gratitude",
    "grateful",
    "love",
    "amusement",
    "amused",
    "contentment",
    "content",
    "satisfaction",
    "pride",
    "relief",
    "delight",
    "enthusiasm",
];

/// Emotion labels in the sadness family
pub const SAD_EMOTIONS: &[&str] = &[
    "sadness",
    "sad",
    "grief",
    "sorrow",
    "disappointment",
    "disappointed",
    "loneliness",
    "lonely",
    "melancholy",
    "hurt",
    "regret",
    "despair",
    "heartbreak",
];

fn in_family(family: &[&str], emotion: &str) -> bool {
    let emotion = emotion.trim().to_lowercase();
    family.iter().any(|e| *e == emotion)
}

/// Whether a classifier label is an anger label
pub fn is_anger_emotion(emotion: &str) -> bool {
    in_family(ANGER_EMOTIONS, emotion)
}

/// Whether a classifier label is a happiness label
pub fn is_happy_emotion(emotion: &str) -> bool {
    in_family(HAPPY_EMOTIONS, emotion)
}

/// Whether a classifier label is a sadness label
pub fn is_sad_emotion(emotion: &str) -> bool {
    in_family(SAD_EMOTIONS, emotion)
}

/// Whether a reply announces the end of the conversation
pub fn contains_goodbye(text: &str) -> bool {
    GOODBYE.is_match(text)
}

/// Signals detected in one utterance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalSignals {
    /// Swearing
    pub profanity: bool,
    /// Insult aimed at the character
    pub insult: bool,
    /// Several all-caps words
    pub shouting: bool,
    /// Three or more `!` in a row
    pub exclamations: bool,
    /// Apology phrase
    pub apology: bool,
    /// Calming or friendly phrase
    pub calm: bool,
}

impl LexicalSignals {
    /// Scan `text`
    pub fn detect(text: &str) -> Self {
        Self {
            profanity: PROFANITY.is_match(text),
            insult: INSULT.is_match(text),
            shouting: SHOUTED_WORD.find_iter(text).count() >= SHOUTED_WORDS_REQUIRED,
            exclamations: REPEATED_EXCLAMATION.is_match(text),
            apology: APOLOGY.is_match(text),
            calm: CALM.is_match(text),
        }
    }

    /// Whether the text is hostile enough to count as angry on its own
    pub fn forces_anger(&self) -> bool {
        self.profanity || self.insult || (self.shouting && self.exclamations)
    }

    /// Names of the signals that fired, for diagnostics
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.profanity, "profanity"),
            (self.insult, "insult"),
            (self.shouting, "shouting"),
            (self.exclamations, "exclamations"),
            (self.apology, "apology"),
            (self.calm, "calm_language"),
        ]
        .into_iter()
        .filter_map(|(hit, name)| hit.then_some(name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profanity_and_insults() {
        let s = LexicalSignals::detect("This is bullshit, you're an idiot");
        assert!(s.profanity);
        assert!(s.insult);
        assert!(s.forces_anger());

        let s = LexicalSignals::detect("Shut up already");
        assert!(s.insult);
        assert!(!s.profanity);
    }

    #[test]
    fn test_shouting_needs_exclamations_to_force_anger() {
        let s = LexicalSignals::detect("I LOVE THIS SO MUCH");
        assert!(s.shouting);
        assert!(!s.forces_anger());

        let s = LexicalSignals::detect("WHY WON'T YOU LISTEN!!!");
        assert!(s.shouting && s.exclamations);
        assert!(s.forces_anger());
    }

    #[test]
    fn test_mild_text_is_clean() {
        let s = LexicalSignals::detect("I am so frustrated!!");
        assert_eq!(s, LexicalSignals::default());
        assert!(s.names().is_empty());
    }

    #[test]
    fn test_apology_and_calm() {
        let s = LexicalSignals::detect("I'm sorry, I didn't mean it. Please calm down.");
        assert!(s.apology);
        assert!(s.calm);
        assert!(!s.forces_anger());
        assert_eq!(s.names(), vec!["apology", "calm_language"]);
    }

    #[test]
    fn test_emotion_families() {
        assert!(is_anger_emotion("Frustration"));
        assert!(is_happy_emotion(" joy "));
        assert!(is_sad_emotion("grief"));
        assert!(!is_anger_emotion("neutral"));
    }

    #[test]
    fn test_goodbye() {
        assert!(contains_goodbye("Fine. Goodbye."));
        assert!(contains_goodbye("<t>*walks away*</t>"));
        assert!(!contains_goodbye("I see you like mystery novels."));
    }
}
