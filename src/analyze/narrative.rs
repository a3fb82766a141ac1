//! Narrative synthesis for finalized events.
//!
//! Two deterministic parts:
//! - a fixed per-category analysis (lookup table);
//! - an optional comparison block built from slot text (word counts, top
//!   keywords, lexicon sentiment, lead sentences, framing cues), present only
//!   when some populated slot carries a real description.
//!
//! A separate perspective summary (coverage, focus areas, reading advice) is
//! produced alongside. Nothing here can fail; missing descriptions degrade to
//! the template-only narrative.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

use super::classify::{classify_event, matching_categories, Category};
use super::triangulate::Event;
use crate::config::NarrativeCfg;
use crate::perspective::Perspective;
use crate::sentiment::{SentimentAnalyzer, SentimentLabel};

static RE_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("keyword regex"));
static RE_SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?。！？]+").expect("sentence regex"));

/// Stopwords for comparison keywords (separate from the title normalizer's list).
const KEYWORD_STOPWORDS: &[&str] = &[
    "that", "with", "this", "from", "have", "would", "could", "should", "what", "when",
    "where", "which", "whom", "about", "their", "there", "they", "were", "been", "said",
    "will", "also", "into", "than",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub category: Category,
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    /// Rendered analysis plus comparison block.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub slots: Vec<SlotProfile>,
    pub angles: Vec<String>,
    pub emphasis: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotProfile {
    pub perspective: Perspective,
    pub word_count: usize,
    pub keywords: Vec<String>,
    pub sentiment: SentimentLabel,
    pub focus: String,
}

/// Cue words (lower-case substrings) and the sentence emitted when any occurs.
struct Cue {
    words: &'static [&'static str],
    text: &'static str,
}

impl Cue {
    fn fires(&self, lower: &str) -> bool {
        self.words.iter().any(|w| lower.contains(w))
    }
}

fn angle_cue(p: Perspective) -> Cue {
    match p {
        Perspective::China => Cue {
            words: &["development", "cooperation", "stability", "progress", "发展", "合作", "稳定"],
            text: "China coverage frames the story around development and stability",
        },
        Perspective::Western => Cue {
            words: &["market", "economy", "risk", "investment", "financial", "市场", "经济", "风险"],
            text: "Western coverage concentrates on markets and risk assessment",
        },
        Perspective::MiddleEast => Cue {
            words: &["humanitarian", "civilian", "on the ground", "victim", "crisis", "人道", "平民", "现场"],
            text: "Middle East coverage centres on humanitarian and on-the-ground detail",
        },
    }
}

fn emphasis_cue(p: Perspective) -> Cue {
    match p {
        Perspective::China => Cue {
            words: &["policy", "measure", "decision", "announce", "政策", "措施", "决定", "宣布"],
            text: "China coverage leans on the policy level",
        },
        Perspective::Western => Cue {
            words: &["impact", "effect", "analysis", "predict", "response", "影响", "反应", "分析", "预测"],
            text: "Western coverage leans on impact analysis",
        },
        Perspective::MiddleEast => Cue {
            words: &["on site", "casualty", "casualties", "crisis", "difficulty", "suffering", "伤亡", "危机", "困难"],
            text: "Middle East coverage leans on conditions at the scene",
        },
    }
}

/// (cue words, focus label) used by the perspective summary.
fn focus_cues(p: Perspective) -> &'static [(&'static [&'static str], &'static str)] {
    match p {
        Perspective::China => &[
            (&["development", "progress", "cooperation", "stability", "发展", "进步", "合作", "稳定"], "development and stability"),
            (&["policy", "measure", "decision", "planning", "政策", "措施", "决定", "规划"], "policy planning"),
            (&["technology", "innovation", "breakthrough", "achievement", "技术", "创新", "突破", "成就"], "technology and innovation"),
        ],
        Perspective::Western => &[
            (&["market", "economy", "financial", "investment"], "markets and the economy"),
            (&["risk", "challenge", "problem", "threat"], "risks and challenges"),
            (&["analysis", "impact", "effect", "consequence"], "impact analysis"),
        ],
        Perspective::MiddleEast => &[
            (&["humanitarian", "civilian", "people", "victim"], "humanitarian concern"),
            (&["on the ground", "site", "location", "scene"], "on-the-ground detail"),
            (&["crisis", "suffering", "difficulty", "challenge"], "crisis and hardship"),
        ],
    }
}

fn perspective_profile(p: Perspective) -> &'static str {
    match p {
        Perspective::China => {
            "Usually frames events through policy, long-term planning, social stability and \
             collective achievement. The register is measured; technology stories stress \
             home-grown innovation and diplomatic stories stress mutually beneficial cooperation."
        }
        Perspective::Western => {
            "Tends to foreground individual rights, institutional checks, market competition and \
             strategic rivalry. Coverage is often critical in tone, tracking power dynamics and \
             latent risk; finance stories lead with market reaction, security stories with threat \
             assessment."
        }
        Perspective::MiddleEast => {
            "Often writes from a Global South vantage point, attentive to on-the-ground detail, \
             humanitarian consequences and unequal power. The style is more narrative, centred on \
             ordinary people, and frequently supplies a counterweight to dominant Western framing."
        }
    }
}

fn advice_cue(p: Perspective) -> Cue {
    match p {
        Perspective::China => Cue {
            words: &["policy", "政策"],
            text: "Read the China coverage for policy intent and the implementation framework",
        },
        Perspective::Western => Cue {
            words: &["impact", "effect", "risk", "market"],
            text: "Read the Western coverage to weigh likely impact and risk variables",
        },
        Perspective::MiddleEast => Cue {
            words: &["human", "civilian", "ground", "site"],
            text: "Read the Middle East coverage for the on-the-ground reality and human dimension",
        },
    }
}

const DEFAULT_ADVICE: [&str; 3] = [
    "Use the China perspective to understand policy intent and the long-term framework",
    "Use the Western perspective to assess market reaction and risk variables",
    "Use the Middle East perspective to see the on-the-ground reality and human dimension",
];

/// Static per-category analysis text.
pub fn analysis_template(category: Category) -> &'static str {
    match category {
        Category::Economic => {
            "Analysis (economic/financial):\n\n\
             1. Fact layer: separate proposals, official statements and measures already in force. \
             Chinese outlets usually report the policy framework and macro targets, Western outlets \
             the market reaction and capital flows, Middle East outlets the effect on developing \
             economies' trade.\n\n\
             2. Expectation layer: headline tone tends to amplify. Check the 10-year Treasury yield, \
             the dollar index and Brent crude alongside the story; they lead the real impact.\n\n\
             3. Execution layer: the verdict comes from cost lines in earnings reports, order data \
             from supply-chain surveys and international fund-flow reports, which single reports \
             rarely follow up.\n\n\
             Suggested stance: give financial news a 48-hour observation window before judging."
        }
        Category::Conflict => {
            "Analysis (geopolitical conflict):\n\n\
             1. Framing differences: Chinese coverage stresses multilateral diplomacy and regional \
             stability, citing official positions and UN resolutions; Western coverage weighs \
             strategic competition, allied coordination and threat assessment; Middle East coverage \
             focuses on civilian casualties, humanitarian crisis and field reporting.\n\n\
             2. Cross-checking facts: build a timeline marking the core facts all three confirm \
             (time, place, casualties, weapon types), then list what each side adds on its own.\n\n\
             3. Impact matrix: short term, shipping indices, oil futures and gold; medium term, \
             sovereign CDS spreads and currency moves; long term, regional supply-chain shifts.\n\n\
             Watch for: early single-cause narratives. Conflicts usually carry long histories and \
             proxy dimensions."
        }
        Category::ScienceTechnology => {
            "Analysis (science & technology):\n\n\
             1. Angle of coverage: Chinese outlets highlight national engineering milestones and \
             self-reliant innovation; Western outlets dwell on technical detail, commercial use and \
             international competition; Middle East outlets on ethics, global cooperation and access \
             for developing countries.\n\n\
             2. Maturity check: distinguish proof of concept, prototype testing and deployment. For \
             space missions track launch windows, mission duration and payload success rather than \
             messaging.\n\n\
             3. Industry knock-on: space and deep tech pull materials, communications, navigation \
             and remote sensing along. Follow listed suppliers, patent filings and cooperation \
             agreements.\n\n\
             Suggested stance: pair mainstream reports with journals and practitioner discussion."
        }
        Category::Diplomatic => {
            "Analysis (diplomatic/political):\n\n\
             1. Agenda setting: Chinese coverage stresses bilateral ties and practical cooperation, \
             focusing on concrete outcomes and joint documents; Western outlets track power dynamics, \
             strategic intent and friction points; Middle East outlets read shifts in the balance of \
             power from a Global South angle.\n\n\
             2. Layers of signal: the surface is statements and protocol, the middle layer is \
             delegation rank and agenda length, the deep layer is later policy and money flows.\n\n\
             3. Historical frame: read the event against at least a decade of the relationship and \
             how each side reacted in comparable situations.\n\n\
             Key reminder: political coverage is the most exposed to ideological filters; read think \
             tank briefs and academic analysis from each side as well."
        }
        Category::Social => {
            "Analysis (social welfare):\n\n\
             1. Policy delivery: Chinese coverage reports new policies and pilot results, stressing \
             public investment and coverage rates; Western outlets favour individual cases, system \
             comparisons and fairness; Middle East outlets global inequality and resource \
             allocation.\n\n\
             2. Data sources: compare official statistics, academic surveys, international \
             assessments and independent polling, minding definitions and sample \
             representativeness.\n\n\
             3. Long-run trend: social policy effects lag by three to five years. Follow research, \
             NGO evaluations and longitudinal studies of affected groups.\n\n\
             Suggested stance: do not infer long-run trends from short-run coverage."
        }
        Category::General => {
            "Analysis (general):\n\n\
             1. Information matrix: tabulate the core elements (time, place, actors, actions, \
             outcomes) across the three reports, then mark the background, causal explanations and \
             value judgements each one adds.\n\n\
             2. Source reliability: check the primary sources each cites (documents, footage, expert \
             interviews, data), anonymous versus named sourcing, and their time and place stamps.\n\n\
             3. Cognitive bias: watch for confirmation bias, availability bias and framing \
             effects.\n\n\
             Final advice: let important stories settle for 24 to 48 hours before forming a stable \
             view."
        }
    }
}

fn category_insight(tags: &[Category]) -> &'static str {
    if tags.contains(&Category::Economic) {
        "Insight (economic): policy statements and market reaction are often out of step; \
         verify against the data released over the following 48 hours."
    } else if tags.contains(&Category::Conflict) {
        "Insight (security): conflict reporting is the most frame-sensitive; separate the \
         statement of facts from the attribution of blame."
    } else if tags.contains(&Category::ScienceTechnology) {
        "Insight (technology): separate proof of concept from commercial rollout and follow \
         patent and supply-chain data."
    } else {
        "Insight: the advantage lies not in reading more of the same coverage but in holding \
         several frames at once, which gives a sturdier, less biased judgement."
    }
}

/// Top `n` qualifying words by frequency; ties keep first occurrence.
pub fn top_keywords(text: &str, n: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for m in RE_KEYWORD.find_iter(&lower) {
        let w = m.as_str();
        if KEYWORD_STOPWORDS.contains(&w) {
            continue;
        }
        match index.get(w) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(w.to_string(), order.len());
                order.push((w.to_string(), 1));
            }
        }
    }
    // stable: equal counts stay in first-occurrence order
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.into_iter().take(n).map(|(w, _)| w).collect()
}

/// First `max` sentences joined by a space, with `...` when more follow.
pub fn key_sentences(text: &str, max: usize) -> String {
    let sentences: Vec<&str> = RE_SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        return String::new();
    }
    let mut out = sentences
        .iter()
        .take(max)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if sentences.len() > max {
        out.push_str("...");
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct NarrativeSynthesizer {
    cfg: NarrativeCfg,
    sentiment: SentimentAnalyzer,
}

impl NarrativeSynthesizer {
    pub fn new(cfg: NarrativeCfg) -> Self {
        Self {
            cfg,
            sentiment: SentimentAnalyzer::new(),
        }
    }

    /// Fill `category`, `narrative` and `summary` in place.
    pub fn annotate(&self, event: &mut Event) {
        let category = classify_event(event);
        event.narrative = Some(self.narrate(event, category));
        event.summary = Some(self.summarize(event));
        event.category = Some(category);
    }

    fn has_detail(&self, event: &Event) -> bool {
        event.populated().any(|(_, it)| {
            it.description
                .as_deref()
                .is_some_and(|d| d.trim().chars().count() > self.cfg.detail_min_chars)
        })
    }

    pub fn narrate(&self, event: &Event, category: Category) -> Narrative {
        let analysis = analysis_template(category).to_string();
        let comparison = self.has_detail(event).then(|| self.compare(event));

        let mut text = analysis.clone();
        if let Some(c) = &comparison {
            text.push_str(&render_comparison(c, category));
        }

        Narrative {
            category,
            analysis,
            comparison,
            text,
        }
    }

    pub fn compare(&self, event: &Event) -> Comparison {
        let slots = event
            .populated()
            .map(|(p, it)| {
                let body = it.body_text();
                SlotProfile {
                    perspective: p,
                    word_count: body.split_whitespace().count(),
                    keywords: top_keywords(body, self.cfg.top_keywords),
                    sentiment: self.sentiment.label(body),
                    focus: key_sentences(body, self.cfg.key_sentences),
                }
            })
            .collect();

        let lowered = |p: Perspective| {
            event
                .slot(p)
                .map(|it| it.body_text().to_lowercase())
                .unwrap_or_default()
        };
        let mut angles = Vec::new();
        let mut emphasis = Vec::new();
        for p in Perspective::ALL {
            let lower = lowered(p);
            if lower.is_empty() {
                continue;
            }
            let a = angle_cue(p);
            if a.fires(&lower) {
                angles.push(a.text.to_string());
            }
            let e = emphasis_cue(p);
            if e.fires(&lower) {
                emphasis.push(e.text.to_string());
            }
        }

        Comparison {
            slots,
            angles,
            emphasis,
        }
    }

    /// Perspective summary: coverage, per-perspective focus, advice and insight.
    pub fn summarize(&self, event: &Event) -> String {
        let tags = matching_categories(&format!(
            "{} {}",
            event.anchor.title_secondary, event.anchor.title_primary
        ));
        let tag_str = if tags.is_empty() {
            Category::General.label().to_string()
        } else {
            tags.iter().map(|c| c.label()).collect::<Vec<_>>().join(", ")
        };

        let mut out = String::new();
        let _ = writeln!(out, "Three-perspective summary ({tag_str} event)\n");

        let labels: Vec<&str> = event.populated().map(|(p, _)| p.label()).collect();
        let _ = writeln!(
            out,
            "Coverage: {}/3 perspectives ({})\n",
            labels.len(),
            labels.join(", ")
        );

        let mut advice = Vec::new();
        for (p, it) in event.populated() {
            let desc = it.description.as_deref().unwrap_or_default().to_lowercase();
            let focus: Vec<&str> = focus_cues(p)
                .iter()
                .filter(|(words, _)| words.iter().any(|w| desc.contains(w)))
                .map(|(_, label)| *label)
                .collect();
            if focus.is_empty() {
                let _ = writeln!(out, "{}: {}\n", p.label(), perspective_profile(p));
            } else {
                let _ = writeln!(
                    out,
                    "{} (focus: {}): {}\n",
                    p.label(),
                    focus.join(", "),
                    perspective_profile(p)
                );
            }
            let cue = advice_cue(p);
            if cue.fires(&desc) {
                advice.push(cue.text);
            }
        }
        if advice.is_empty() {
            advice.extend(DEFAULT_ADVICE);
        }

        let _ = writeln!(out, "Reading advice:");
        for (i, a) in advice.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, a);
        }
        let _ = write!(out, "\n{}", category_insight(&tags));
        out
    }
}

fn render_comparison(c: &Comparison, category: Category) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "\n\nComparison of the coverage ({} event)\n\n",
        category.label()
    );
    for s in &c.slots {
        let _ = writeln!(out, "{} focus: {}\n", s.perspective.label(), s.focus);
    }

    let _ = writeln!(out, "Text analysis:");
    let lengths: Vec<String> = c
        .slots
        .iter()
        .map(|s| format!("{}: {} words", s.perspective.label(), s.word_count))
        .collect();
    let _ = writeln!(out, "1. Length: {}", lengths.join(" | "));

    let keywords: Vec<String> = c
        .slots
        .iter()
        .filter(|s| !s.keywords.is_empty())
        .map(|s| format!("{}: {}", s.perspective.label(), s.keywords.join(", ")))
        .collect();
    if !keywords.is_empty() {
        let _ = writeln!(out, "2. Keywords: {}", keywords.join(" | "));
    }

    let sentiments: Vec<String> = c
        .slots
        .iter()
        .map(|s| format!("{}: {}", s.perspective.label(), s.sentiment))
        .collect();
    let _ = writeln!(out, "3. Sentiment: {}", sentiments.join(" | "));

    if c.angles.is_empty() {
        let _ = writeln!(out, "4. Angle: each outlet reports within its usual frame.");
    } else {
        let _ = writeln!(out, "4. Angle: {}.", c.angles.join("; "));
    }
    if c.emphasis.is_empty() {
        let _ = writeln!(
            out,
            "5. Emphasis: no clear difference in factual emphasis from the available descriptions."
        );
    } else {
        let _ = writeln!(out, "5. Emphasis: {}.", c.emphasis.join("; "));
    }
    let _ = write!(
        out,
        "6. Reading advice: together the three give a fuller picture; China supplies the policy \
         frame, the West the risk analysis, the Middle East the ground reality."
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::triangulate::{Alignment, Anchor};
    use crate::ingest::types::Item;
    use crate::perspective::PerPerspective;

    fn event(cn: Option<Item>, us: Option<Item>, me: Option<Item>) -> Event {
        let slots = PerPerspective::new(cn, us, me);
        let (p, first) = slots
            .iter()
            .find_map(|(p, s)| s.as_ref().map(|it| (p, it.clone())))
            .unwrap();
        let media_count = slots.iter().filter(|(_, s)| s.is_some()).count();
        Event {
            anchor: Anchor {
                perspective: p,
                title: first.title.clone(),
                title_primary: first.match_title().to_string(),
                title_secondary: first.display_title().to_string(),
            },
            slots,
            media_count,
            score: 3,
            alignment: Alignment::Lexical,
            category: None,
            narrative: None,
            summary: None,
        }
    }

    #[test]
    fn top_keywords_breaks_ties_by_first_occurrence() {
        let text = "Tariff talks: tariffs, tariff. Markets slide while markets wait; tariff";
        assert_eq!(top_keywords(text, 2), vec!["tariff", "markets"]);
        // all once: first occurrence order, stopwords and short words skipped
        assert_eq!(
            top_keywords("This plan would help farmers and exporters", 3),
            vec!["plan", "help", "farmers"]
        );
        assert!(top_keywords("", 3).is_empty());
    }

    #[test]
    fn key_sentences_truncates_with_ellipsis() {
        assert_eq!(key_sentences("One. Two! Three?", 2), "One Two...");
        assert_eq!(key_sentences("一句话。第二句", 2), "一句话 第二句");
        assert_eq!(key_sentences("   ", 2), "");
    }

    #[test]
    fn template_only_without_descriptions() {
        let e = event(
            Some(Item::new("Tariff policy trade", "cn")),
            Some(Item::new("Tariff policy trade", "us")),
            None,
        );
        let n = NarrativeSynthesizer::default().narrate(&e, Category::Economic);
        assert!(n.comparison.is_none());
        assert_eq!(n.text, analysis_template(Category::Economic));
    }

    #[test]
    fn short_descriptions_do_not_trigger_comparison() {
        let e = event(
            Some(Item::new("Tariff policy", "cn").with_description("Short blurb.")),
            Some(Item::new("Tariff policy", "us")),
            None,
        );
        assert!(NarrativeSynthesizer::default()
            .narrate(&e, Category::Economic)
            .comparison
            .is_none());
    }

    #[test]
    fn comparison_block_profiles_each_populated_slot() {
        let e = event(
            Some(Item::new("Tariff policy", "cn").with_description(
                "The ministry will announce a new tariff policy to support development and \
                 stability. Officials expect progress. More details follow.",
            )),
            None,
            Some(Item::new("Tariff policy", "me").with_description(
                "Civilian traders face a crisis as tariff costs climb; humanitarian groups warn of \
                 loss and suffering.",
            )),
        );
        let n = NarrativeSynthesizer::default().narrate(&e, Category::Economic);
        let c = n.comparison.expect("comparison");
        assert_eq!(c.slots.len(), 2);
        assert_eq!(c.slots[0].perspective, Perspective::China);
        assert_eq!(c.slots[0].sentiment, SentimentLabel::Positive);
        assert_eq!(c.slots[1].sentiment, SentimentLabel::Negative);
        assert!(c.slots[0].focus.ends_with("..."));
        assert_eq!(c.angles.len(), 2);
        assert_eq!(c.emphasis.len(), 2);
        assert!(n.text.starts_with(analysis_template(Category::Economic)));
        assert!(n.text.contains("1. Length: China:"));
        assert!(n.text.contains("3. Sentiment: China: positive | Middle East: negative"));
    }

    #[test]
    fn annotate_sets_category_narrative_and_summary() {
        let mut e = event(
            Some(Item::new("导弹袭击", "cn").with_translations("Missile attack near border", "边境导弹袭击")),
            Some(Item::new("Missile attack near border", "us")),
            None,
        );
        NarrativeSynthesizer::default().annotate(&mut e);
        assert_eq!(e.category, Some(Category::Conflict));
        assert_eq!(e.narrative.as_ref().unwrap().category, Category::Conflict);
        let summary = e.summary.unwrap();
        assert!(summary.contains("Coverage: 2/3 perspectives (China, Western)"));
        // no cue hits: default three-point advice
        assert!(summary.contains("3. Use the Middle East perspective"));
        assert!(summary.contains("Insight (security)"));
    }

    #[test]
    fn output_is_deterministic() {
        let e = event(
            Some(Item::new("Rocket launch", "cn").with_description(
                "Engineers hail a breakthrough achievement as the rocket launch succeeds after \
                 years of development.",
            )),
            Some(Item::new("Rocket launch", "us")),
            None,
        );
        let s = NarrativeSynthesizer::default();
        let mut a = e.clone();
        let mut b = e;
        s.annotate(&mut a);
        s.annotate(&mut b);
        assert_eq!(a, b);
    }
}
