//! Fixed scoring taxonomy: axis definitions, keyword tables, and the tag
//! vocabulary. Both scorers share this data so remote and fallback results
//! stay comparable.

use prospector_shared::Axis;

/// Multiplier applied to raw keyword counts before clamping to [`AXIS_MAX`].
///
/// [`AXIS_MAX`]: prospector_shared::AXIS_MAX
pub const NORMALIZATION_FACTOR: f64 = 2.5;

/// Keyword list for one axis, matched case-insensitively as substrings.
pub fn axis_keywords(axis: Axis) -> &'static [&'static str] {
    match axis {
        Axis::Digitization => &[
            "ocr",
            "document",
            "scan",
            "digitization",
            "digitisation",
            "pdf",
            "paper",
            "archive",
            "capture",
            "recognition",
        ],
        Axis::Extraction => &[
            "data extraction",
            "data mining",
            "analytics",
            "intelligence",
            "etl",
            "data processing",
            "information extraction",
            "nlp",
            "text mining",
        ],
        Axis::Certification => &[
            "certification",
            "trust",
            "blockchain",
            "security",
            "authentication",
            "verification",
            "compliance",
            "audit",
            "identity",
        ],
        Axis::Delivery => &[
            "dashboard",
            "portal",
            "api",
            "collaboration",
            "sharing",
            "access",
            "interface",
            "platform",
            "workspace",
        ],
    }
}

/// Human-readable axis definition used in the remote prompt.
pub fn axis_definition(axis: Axis) -> &'static str {
    match axis {
        Axis::Digitization => {
            "Document digitization (OCR, scanning, digitalization, document capture)"
        }
        Axis::Extraction => {
            "Data valorization and extraction (data mining, analytics, AI, automated processing)"
        }
        Axis::Certification => {
            "Certification and trusted third party (blockchain, security, authentication, audit, compliance)"
        }
        Axis::Delivery => {
            "Information delivery (dashboards, APIs, portals, collaboration, sharing)"
        }
    }
}

/// The five fixed category tags and their keyword sets. A tag applies when
/// any of its keywords appears as a substring of the combined lowercased
/// text — a presence test, no threshold.
pub const TAG_VOCABULARY: [(&str, &[&str]); 5] = [
    (
        "Edge computing",
        &["edge", "fog", "distributed", "iot", "real-time", "latency"],
    ),
    (
        "Sustainability",
        &[
            "sustainability",
            "esg",
            "carbon",
            "environment",
            "social",
            "governance",
            "ethics",
            "responsible",
            "green",
        ],
    ),
    (
        "Augmented risk",
        &[
            "cybersecurity",
            "fraud",
            "monitoring",
            "risk",
            "security",
            "compliance",
            "regulation",
        ],
    ),
    (
        "Game changer",
        &[
            "disruption",
            "innovation",
            "breakthrough",
            "revolutionary",
            "transformation",
            "ai",
            "quantum",
        ],
    ),
    (
        "Prospective",
        &[
            "future",
            "vision",
            "roadmap",
            "strategy",
            "long-term",
            "emerging",
            "next-gen",
        ],
    ),
];
