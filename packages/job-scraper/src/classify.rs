//! Keyword classification of canonical jobs.
//!
//! Two independent pure functions: `categorize` assigns exactly one value
//! from the closed category set, `detect_no_phone` flags postings that do
//! not require live voice work.

use crate::types::Category;

/// Explicit indicators that a posting does not involve phone work.
const NO_PHONE_KEYWORDS: &[&str] = &[
    "chat",
    "email",
    "written",
    "async",
    "text",
    "no phone",
    "non-phone",
    "no calls",
    "email only",
    "chat support",
    "email support",
    "written communication",
];

/// Indicators that the role likely involves phone work.
const PHONE_KEYWORDS: &[&str] = &[
    "phone", "call", "calling", "inbound", "outbound", "voice", "telephon",
];

/// Which text a categorization rule matches against.
enum RuleText {
    Title,
    Tags,
}

/// Ordered categorization rules; the first match wins, so the order here is
/// load-bearing: a "customer support engineer" is support, not dev.
const CATEGORY_RULES: &[(RuleText, &[&str], Category)] = &[
    (
        RuleText::Title,
        &["support", "customer", "service", "helpdesk", "help desk"],
        Category::Support,
    ),
    (
        RuleText::Title,
        &["moderator", "moderation", "content review", "trust & safety"],
        Category::Moderation,
    ),
    (
        RuleText::Title,
        &["data entry", "transcription", "typing", "data input"],
        Category::DataEntry,
    ),
    (
        RuleText::Title,
        &[
            "virtual assistant",
            "executive assistant",
            "personal assistant",
            "admin assistant",
        ],
        Category::Va,
    ),
    (
        RuleText::Title,
        &[
            "developer",
            "engineer",
            "programmer",
            "software",
            "frontend",
            "backend",
            "fullstack",
        ],
        Category::Dev,
    ),
    (
        RuleText::Tags,
        &["javascript", "python", "react", "node", "golang", "rust"],
        Category::Dev,
    ),
    (
        RuleText::Title,
        &["designer", "design", "ui", "ux", "graphic"],
        Category::Design,
    ),
    (
        RuleText::Title,
        &["marketing", "seo", "content", "social media", "growth"],
        Category::Marketing,
    ),
    (
        RuleText::Title,
        &["sales", "account executive", "sdr", "bdr", "business development"],
        Category::Sales,
    ),
    (
        RuleText::Title,
        &["writer", "copywriter", "editor", "content creator"],
        Category::Writing,
    ),
    (
        RuleText::Title,
        &["recruiter", "recruiting", "hr ", "human resources", "people ops"],
        Category::Hr,
    ),
];

/// Assign a category from the title (and, for development roles, the tags).
pub fn categorize(title: &str, tags: &[String]) -> Category {
    let title = title.to_lowercase();
    let tags: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();

    for (text, keywords, category) in CATEGORY_RULES {
        let matched = match text {
            RuleText::Title => keywords.iter().any(|k| title.contains(k)),
            RuleText::Tags => keywords.iter().any(|k| tags.iter().any(|t| t == k)),
        };
        if matched {
            return *category;
        }
    }

    Category::Other
}

/// Detect whether a posting is likely phone-free.
///
/// No-phone indicators are checked first and short-circuit: an explicit
/// "email only" wins even when "phone" also appears somewhere in the text.
/// When neither set matches, the posting is assumed to possibly require a
/// phone.
pub fn detect_no_phone(title: &str, description: Option<&str>) -> bool {
    let text = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();

    if NO_PHONE_KEYWORDS.iter().any(|k| text.contains(k)) {
        return true;
    }
    if PHONE_KEYWORDS.iter().any(|k| text.contains(k)) {
        return false;
    }
    false
}
