//! The fixed topic taxonomy, the keyword classifier over it, and the
//! per-theme scraping configuration.
//!
//! Taxonomy declaration order is part of the contract: classification ties
//! resolve to the earlier topic, so reordering `TAXONOMY` changes output.

use serde::{Deserialize, Serialize};

/// The thirteen watch topics, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Topic {
    Agriculture,
    Culture,
    Diplomacy,
    Economy,
    Education,
    Environment,
    Governance,
    DigitalTech,
    Politics,
    Health,
    Security,
    Sport,
    Society,
}

impl Topic {
    pub const ALL: [Topic; 13] = [
        Topic::Agriculture,
        Topic::Culture,
        Topic::Diplomacy,
        Topic::Economy,
        Topic::Education,
        Topic::Environment,
        Topic::Governance,
        Topic::DigitalTech,
        Topic::Politics,
        Topic::Health,
        Topic::Security,
        Topic::Sport,
        Topic::Society,
    ];

    /// Assigned when no taxonomy keyword matches at all.
    pub const DEFAULT: Topic = Topic::Society;

    /// Human-facing label, as shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Topic::Agriculture => "Agriculture",
            Topic::Culture => "Culture",
            Topic::Diplomacy => "Diplomacy",
            Topic::Economy => "Economy",
            Topic::Education => "Education",
            Topic::Environment => "Environment",
            Topic::Governance => "Governance",
            Topic::DigitalTech => "Digital / Tech",
            Topic::Politics => "Politics",
            Topic::Health => "Health",
            Topic::Security => "Security",
            Topic::Sport => "Sport",
            Topic::Society => "Society / Gender",
        }
    }

    /// Parse a CLI/user-supplied theme name. Accepts the label or the
    /// storage slug, case-insensitively.
    pub fn parse(name: &str) -> Option<Topic> {
        let wanted = name.trim().to_lowercase();
        Topic::ALL.into_iter().find(|t| {
            t.label().to_lowercase() == wanted
                || slug(*t) == wanted
        })
    }
}

fn slug(topic: Topic) -> &'static str {
    match topic {
        Topic::Agriculture => "agriculture",
        Topic::Culture => "culture",
        Topic::Diplomacy => "diplomacy",
        Topic::Economy => "economy",
        Topic::Education => "education",
        Topic::Environment => "environment",
        Topic::Governance => "governance",
        Topic::DigitalTech => "digital_tech",
        Topic::Politics => "politics",
        Topic::Health => "health",
        Topic::Security => "security",
        Topic::Sport => "sport",
        Topic::Society => "society",
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Classification taxonomy
// ---------------------------------------------------------------------------

/// Marker keywords per topic. Matching is lowercase substring containment,
/// so short markers deliberately catch word families ("electoral" via
/// "elect", and so on).
pub const TAXONOMY: &[(Topic, &[&str])] = &[
    (Topic::Agriculture, &[
        "agricultur", "farming", "farmer", "harvest", "crop", "irrigation",
        "seed", "livestock", "herder", "pastoral", "food security",
    ]),
    (Topic::Culture, &[
        "culture", "cultural", "artist", "music", "cinema", "festival",
        "theatre", "heritage", "museum", "tradition",
    ]),
    (Topic::Diplomacy, &[
        "diplomacy", "diplomatic", "embassy", "ambassador", "bilateral",
        "cooperation", "summit", "treaty", "foreign affairs",
    ]),
    (Topic::Economy, &[
        "economy", "economic", "finance", "financial", "budget",
        "investment", "trade", "market", "business", "inflation", "growth",
    ]),
    (Topic::Education, &[
        "education", "school", "university", "student", "teacher",
        "curriculum", "literacy", "classroom", "exam",
    ]),
    (Topic::Environment, &[
        "environment", "climate", "pollution", "ecology", "biodiversity",
        "drought", "deforestation", "flood", "desertification",
    ]),
    (Topic::Governance, &[
        "governance", "government", "administration", "administrative",
        "reform", "institution", "decentralization", "corruption",
        "public service",
    ]),
    (Topic::DigitalTech, &[
        "digital", "internet", "technology", "telecom", "startup", "cyber",
        "innovation", "broadband", "mobile money", "data protection",
    ]),
    (Topic::Politics, &[
        "politic", "party", "election", "electoral", "president",
        "minister", "parliament", "deputy", "opposition", "coalition",
    ]),
    (Topic::Health, &[
        "health", "medical", "hospital", "disease", "vaccination",
        "clinic", "patient", "doctor", "epidemic", "malaria", "nutrition",
    ]),
    (Topic::Security, &[
        "security", "police", "army", "military", "terrorism", "defense",
        "conflict", "attack", "insurgent", "crime", "kidnapping",
    ]),
    (Topic::Sport, &[
        "sport", "football", "athlete", "competition", "championship",
        "team", "match", "player", "coach", "tournament",
    ]),
    (Topic::Society, &[
        "society", "social", "women", "gender", "equality", "community",
        "youth", "family", "rights", "citizen", "refugee",
    ]),
];

/// Classify free text into the taxonomy by keyword salience.
///
/// Scores are summed substring-occurrence counts per topic; the maximum
/// wins and ties go to the earlier topic in `TAXONOMY`. Zero everywhere
/// falls back to [`Topic::DEFAULT`].
pub fn classify(text: &str) -> Topic {
    let text = text.to_lowercase();

    let mut best = Topic::DEFAULT;
    let mut best_score = 0usize;

    for (topic, keywords) in TAXONOMY {
        let score: usize = keywords
            .iter()
            .map(|kw| text.matches(kw).count())
            .sum();
        if score > best_score {
            best = *topic;
            best_score = score;
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Per-theme scraping configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Hourly,
    Daily,
}

/// Targeted scraping configuration for one theme. Loaded once per run and
/// immutable for its duration.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    pub topic: Topic,
    pub keywords: &'static [&'static str],
    pub max_articles: usize,
    pub priority: Priority,
    pub cadence: Cadence,
}

/// Build the scraping configuration for one theme.
pub fn theme_config(topic: Topic) -> ThemeConfig {
    let (keywords, max_articles, priority, cadence): (&'static [&'static str], usize, Priority, Cadence) = match topic {
        Topic::Agriculture => (&[
            "Niger agriculture", "Sahel farming", "Niger millet harvest",
            "Niger irrigation project", "Sahel livestock herders",
            "Niger food security", "Niger drought crops",
            "Niger agricultural cooperative", "Sahel pastoralism",
            "Niger farming season",
        ], 15, Priority::High, Cadence::Daily),
        Topic::Culture => (&[
            "Niger culture", "Niger music festival", "Niger cinema",
            "Niger heritage site", "Sahel traditional arts",
            "Niger artist", "Niamey cultural center", "Niger museum",
        ], 12, Priority::Medium, Cadence::Daily),
        Topic::Diplomacy => (&[
            "Niger diplomacy", "Niger foreign relations", "ECOWAS Niger",
            "African Union Niger", "Niger France relations",
            "Niger Russia cooperation", "Sahel alliance summit",
            "Niger ambassador", "Niger bilateral agreement",
        ], 15, Priority::High, Cadence::Daily),
        Topic::Economy => (&[
            "Niger economy", "Niger uranium exports", "Niger oil pipeline",
            "Niger budget", "Niger inflation", "Sahel trade",
            "Niger investment", "Niger mining sector", "Niger GDP growth",
            "West Africa monetary union Niger",
        ], 18, Priority::High, Cadence::Daily),
        Topic::Education => (&[
            "Niger education", "Niger schools", "Niamey university",
            "Niger teachers strike", "Niger literacy program",
            "Niger school enrollment", "Niger student exams",
        ], 15, Priority::High, Cadence::Daily),
        Topic::Environment => (&[
            "Niger environment", "Niger climate change", "Sahel drought",
            "Niger floods", "Niger River basin", "Niger desertification",
            "Niger solar energy", "Great Green Wall Niger",
        ], 12, Priority::Medium, Cadence::Daily),
        Topic::Governance => (&[
            "Niger governance", "Niger public administration",
            "Niger anti-corruption", "Niger judiciary",
            "Niger decentralization", "Niger civil service reform",
            "Niger local councils",
        ], 12, Priority::Medium, Cadence::Daily),
        Topic::DigitalTech => (&[
            "Niger digital economy", "Niger internet access",
            "Niger telecom", "Niamey startup", "Niger mobile money",
            "Niger cybersecurity", "Niger e-government",
            "Sahel tech innovation",
        ], 12, Priority::Medium, Cadence::Daily),
        Topic::Politics => (&[
            "Niger politics", "Niger government", "Niger junta",
            "Niger transition", "Niger president", "Niger council ministers",
            "Niger opposition", "Niger political parties",
            "Niger national assembly", "Sahel politics",
        ], 20, Priority::Critical, Cadence::Hourly),
        Topic::Health => (&[
            "Niger health", "Niger hospital", "Niger vaccination campaign",
            "Niger malaria", "Niger meningitis outbreak", "Niger cholera",
            "Niger malnutrition", "Niger maternal health", "WHO Niger",
        ], 15, Priority::High, Cadence::Daily),
        Topic::Security => (&[
            "Niger security", "Niger army", "Niger attack",
            "Sahel terrorism", "Niger Tillaberi violence",
            "Niger Diffa Boko Haram", "Niger military operation",
            "Niger border security", "tri-border Sahel",
            "Niger kidnapping",
        ], 20, Priority::Critical, Cadence::Hourly),
        Topic::Sport => (&[
            "Niger football", "Mena national team", "Niger AFCON",
            "Niger athletics", "Niger wrestling championship",
            "Niamey stadium", "Niger sports federation",
        ], 10, Priority::Medium, Cadence::Daily),
        Topic::Society => (&[
            "Niger society", "Niger women rights", "Niger youth employment",
            "Niger civil society", "Niger displaced people",
            "Niger refugees", "Niger diaspora", "Niger gender equality",
            "Niger child protection",
        ], 15, Priority::Medium, Cadence::Daily),
    };

    ThemeConfig { topic, keywords, max_articles, priority, cadence }
}

/// The admin-wide keyword list for the global pass, covering the whole
/// watch domain rather than one theme.
pub const GLOBAL_KEYWORDS: &[&str] = &[
    // Institutions and politics
    "Niger", "Niger government", "Niger junta", "Niger transition council",
    // Geopolitics and alliances
    "Sahel alliance", "Alliance of Sahel States", "Mali Niger Burkina",
    "ECOWAS Niger", "Niger sovereignty",
    // Security and defense
    "Niger army", "Niger terrorism", "Niger attack", "Niger gendarmerie",
    "Niger border", "Niger military operation",
    // Economy and development
    "Niger uranium", "Niger oil", "Niger finance", "Niger development",
    "Niger grain prices", "Niger startups",
    // Society and daily life
    "Niger health", "Niger education", "Niger floods",
    "Niger civil society", "Niger diaspora",
    // Key cities
    "Niamey", "Agadez", "Diffa", "Zinder", "Maradi", "Tahoua",
    "Tillaberi", "Dosso",
    // Press and media
    "Niger news", "Niger press", "Niger journal",
];
