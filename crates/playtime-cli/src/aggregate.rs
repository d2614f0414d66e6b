//! Reading-time aggregator: records to minutes.

use std::collections::BTreeMap;

use playtime_core::{BlockCost, Category, CostAggregator, Dialogue, Record};

use crate::config::ReadingConfig;

/// Hiragana, katakana, CJK ideographs and halfwidth katakana.
const CJK_RANGES: [(char, char); 5] = [
    ('\u{3040}', '\u{30FF}'),
    ('\u{3400}', '\u{4DBF}'),
    ('\u{4E00}', '\u{9FFF}'),
    ('\u{F900}', '\u{FAFF}'),
    ('\u{FF66}', '\u{FF9F}'),
];

fn is_cjk(c: char) -> bool {
    CJK_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
}

/// Aggregator injected into the graph builder. All costs are in minutes.
#[derive(Debug, Clone)]
pub struct ReadingAggregator {
    speed: f64,
    cjk_speed: f64,
    scene: f64,
    show: f64,
    next: f64,
    pauses: bool,
    by_characters: bool,
}

impl ReadingAggregator {
    #[must_use]
    pub const fn new(config: &ReadingConfig, by_characters: bool) -> Self {
        Self {
            speed: config.speed,
            cjk_speed: config.cjk_speed,
            scene: config.scene,
            show: config.show,
            next: config.next,
            pauses: config.pause,
            by_characters,
        }
    }

    /// Minutes to read one dialogue line and advance past it.
    #[must_use]
    pub fn dialogue_minutes(&self, dialogue: &Dialogue) -> f64 {
        let total = dialogue.text.chars().count();
        let cjk = dialogue.text.chars().filter(|&c| is_cjk(c)).count();
        (total - cjk) as f64 / self.speed
            + cjk as f64 / self.cjk_speed
            + (dialogue.extra_seconds + self.next) / 60.0
    }

    fn record_minutes(&self, record: &Record) -> Option<(Category, f64)> {
        match record {
            // An empty line is a bare wait; it is not read and never advanced.
            Record::Dialogue(d) if d.text.is_empty() => None,
            Record::Dialogue(d) => {
                Some((Category::Speaker(d.speaker.clone()), self.dialogue_minutes(d)))
            }
            Record::Pause { seconds } => Some((Category::Pause, seconds / 60.0)),
            Record::Scene => Some((Category::Scene, self.scene / 60.0)),
            Record::Show => Some((Category::Show, self.show / 60.0)),
        }
    }

    fn empty_breakdown(&self) -> BTreeMap<Category, f64> {
        let mut parts = BTreeMap::from([(Category::Scene, 0.0), (Category::Show, 0.0)]);
        if self.pauses {
            parts.insert(Category::Pause, 0.0);
        }
        parts
    }
}

impl CostAggregator for ReadingAggregator {
    fn aggregate(&self, records: &[Record]) -> BlockCost {
        let costs = records.iter().filter_map(|r| self.record_minutes(r));
        if !self.by_characters {
            return BlockCost::new(costs.map(|(_, minutes)| minutes).sum());
        }

        let mut parts = self.empty_breakdown();
        let mut total = 0.0;
        for (category, minutes) in costs {
            total += minutes;
            *parts.entry(category).or_insert(0.0) += minutes;
        }
        BlockCost::with_breakdown(total, parts)
    }
}
