//! User-Agent based crawler detection.
//!
//! Link-preview crawlers (Facebook, Twitter, WhatsApp, ...) need static HTML
//! with Open Graph tags, while browsers should land in the client app. The
//! only signal available is the `User-Agent` header, so detection is a
//! best-effort substring match against a list of known signatures.
//!
//! The signatures are plain data. [`UserAgentClassifier::with_extra_signatures`]
//! appends more at startup without touching the matching logic.

use std::sync::LazyLock;

use regex::{RegexSet, RegexSetBuilder};

/// Crawler signatures matched case-insensitively anywhere in the header.
///
/// `bot` alone already covers most of the named crawlers; the explicit names
/// stay so the matched signature in logs says who was asking.
pub const DEFAULT_CRAWLER_SIGNATURES: &[&str] = &[
    "facebookexternalhit",
    "facebot",
    "twitterbot",
    "whatsapp",
    "linkedinbot",
    "pinterest",
    "slackbot",
    "telegrambot",
    "discordbot",
    "googlebot",
    "bingbot",
    "duckduckbot",
    "baiduspider",
    "yandexbot",
    "ia_archiver",
    "slurp",
    "bot",
];

/// Who is on the other end of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    /// An automated link-preview crawler.
    Bot,
    /// Anything else, including requests without a `User-Agent`.
    Human,
}

impl Audience {
    /// Lowercase label, used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::Human => "human",
        }
    }
}

/// Result of classifying a single `User-Agent` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    /// Bot or human.
    pub audience: Audience,
    /// First signature (in list order) that matched, if any.
    pub matched: Option<&'a str>,
}

impl Classification<'_> {
    /// Shorthand for `audience == Audience::Bot`.
    pub fn is_bot(&self) -> bool {
        self.audience == Audience::Bot
    }
}

/// Compiled crawler signature set.
///
/// Build once at startup and share; classification never fails.
#[derive(Debug, Clone)]
pub struct UserAgentClassifier {
    signatures: Vec<String>,
    set: RegexSet,
}

impl UserAgentClassifier {
    /// Classifier over [`DEFAULT_CRAWLER_SIGNATURES`].
    pub fn new() -> Self {
        Self {
            signatures: DEFAULT_CRAWLER_SIGNATURES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            set: DEFAULT_SET.clone(),
        }
    }

    /// Classifier over the defaults plus `extra` literal tokens.
    ///
    /// Tokens are matched literally (regex metacharacters are escaped), and
    /// blank or duplicate tokens are skipped. Fails when the combined set
    /// cannot be compiled, e.g. because it exceeds the regex size limit.
    pub fn with_extra_signatures<I, S>(extra: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classifier = Self::new();

        let before = classifier.signatures.len();
        for token in extra {
            let token = token.as_ref().trim().to_lowercase();
            if !token.is_empty() && !classifier.signatures.contains(&token) {
                classifier.signatures.push(token);
            }
        }

        if classifier.signatures.len() > before {
            classifier.set = build_set(&classifier.signatures)?;
        }

        Ok(classifier)
    }

    /// The active signature list, in match-priority order.
    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    /// Classify a raw header value. `None` and empty strings are human.
    pub fn classify(&self, user_agent: Option<&str>) -> Classification<'_> {
        let ua = user_agent.unwrap_or_default();
        if ua.trim().is_empty() {
            return Classification {
                audience: Audience::Human,
                matched: None,
            };
        }

        let matched = self
            .set
            .matches(ua)
            .iter()
            .next()
            .map(|idx| self.signatures[idx].as_str());

        Classification {
            audience: if matched.is_some() {
                Audience::Bot
            } else {
                Audience::Human
            },
            matched,
        }
    }

    /// Whether the header identifies a crawler.
    pub fn is_bot(&self, user_agent: Option<&str>) -> bool {
        self.classify(user_agent).is_bot()
    }
}

/// Compiled defaults, shared by every classifier built from them.
static DEFAULT_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    build_set(DEFAULT_CRAWLER_SIGNATURES).expect("default crawler signatures are plain literals")
});

fn build_set<S: AsRef<str>>(signatures: &[S]) -> Result<RegexSet, regex::Error> {
    RegexSetBuilder::new(signatures.iter().map(|s| regex::escape(s.as_ref())))
        .case_insensitive(true)
        .build()
}

impl Default for UserAgentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
