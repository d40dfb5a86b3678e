//! Ordered decision rules.
//!
//! Each rule is a guard over a [`Ranking`] and a builder producing the
//! verdict. The engine evaluates the table top to bottom and the first guard
//! that holds decides; [`top_class`] applies when none does.

use weather_common::{ClassConfidence, ConfidenceList, WeatherClass};

use crate::{
    config::FusionConfig,
    entropy::shannon_entropy,
    verdict::{RuleKind, Verdict},
};

use WeatherClass::{Berawan, Berkabut, Cerah, Hujan};

/// A non-empty confidence list in descending order with its entropy
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    config: &'a FusionConfig,
    entries: Vec<ClassConfidence>,
    entropy: f64,
}

impl<'a> Ranking<'a> {
    /// Returns `None` for an empty list. Entries are re-sorted by percent,
    /// keeping the incoming order among equal values.
    pub fn new(list: &ConfidenceList, config: &'a FusionConfig) -> Option<Self> {
        if list.is_empty() {
            return None;
        }
        let mut entries = list.entries().to_vec();
        entries.sort_by(|a, b| b.percent.total_cmp(&a.percent));
        let entropy = shannon_entropy(entries.iter().map(|e| e.percent));
        Some(Self { config, entries, entropy })
    }

    pub fn config(&self) -> &FusionConfig {
        self.config
    }

    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    pub fn top(&self) -> ClassConfidence {
        self.entries[0]
    }

    pub fn second(&self) -> Option<ClassConfidence> {
        self.entries.get(1).copied()
    }

    pub fn third(&self) -> Option<ClassConfidence> {
        self.entries.get(2).copied()
    }

    pub fn percent_of(&self, class: WeatherClass) -> f64 {
        self.entries
            .iter()
            .find(|e| e.class == class)
            .map_or(0.0, |e| e.percent)
    }

    /// Every class in `classes` ranks among the first `n`
    pub fn in_top(&self, n: usize, classes: &[WeatherClass]) -> bool {
        let leading = &self.entries[..n.min(self.entries.len())];
        classes.iter().all(|class| leading.iter().any(|e| e.class == *class))
    }

    /// The first two ranks are exactly `a` and `b`, in either order
    pub fn top_two_are(&self, a: WeatherClass, b: WeatherClass) -> bool {
        match self.second() {
            Some(second) => {
                let pair = (self.top().class, second.class);
                pair == (a, b) || pair == (b, a)
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub kind: RuleKind,
    pub guard: fn(&Ranking<'_>) -> bool,
    pub build: fn(&Ranking<'_>) -> Verdict,
}

/// Rules in evaluation order
pub const STANDARD_RULES: &[Rule] = &[
    Rule { kind: RuleKind::Mixed, guard: is_mixed, build: mixed },
    Rule { kind: RuleKind::Dominant, guard: is_dominant, build: dominant },
    Rule { kind: RuleKind::RainWithFog, guard: is_rain_with_fog, build: rain_with_fog },
    Rule { kind: RuleKind::Overcast, guard: is_overcast, build: overcast },
    Rule { kind: RuleKind::PartlyCloudy, guard: is_partly_cloudy, build: partly_cloudy },
    Rule { kind: RuleKind::Sunshower, guard: is_sunshower, build: sunshower },
];

fn is_mixed(r: &Ranking<'_>) -> bool {
    r.entropy() > r.config().entropy_threshold
}

fn mixed(r: &Ranking<'_>) -> Verdict {
    let top = r.top();
    let runner_up = match r.second() {
        Some(second) => format!(
            "namun <strong>{}</strong> ({}%) juga memiliki probabilitas signifikan. ",
            second.class, second.percent
        ),
        None => String::new(),
    };
    Verdict::new(
        RuleKind::Mixed,
        "Cuaca Campuran",
        top.class.name(),
        format!(
            "Kondisi cuaca sangat tidak pasti dan menunjukkan campuran dari beberapa elemen. \
             Prediksi teratas adalah <strong>{}</strong> ({}%), {}\
             Entropi distribusi ({:.2}) yang tinggi menandakan ketidakpastian model.",
            top.class,
            top.percent,
            runner_up,
            r.entropy()
        ),
    )
}

fn is_dominant(r: &Ranking<'_>) -> bool {
    r.top().percent >= r.config().dominant_percent
}

fn dominant(r: &Ranking<'_>) -> Verdict {
    let top = r.top();
    Verdict::new(
        RuleKind::Dominant,
        top.class.name(),
        top.class.name(),
        format!(
            "Kondisi cuaca teridentifikasi secara definitif sebagai <strong>{}</strong>. \
             Model memiliki keyakinan sangat tinggi ({}%) pada prediksi ini.",
            top.class, top.percent
        ),
    )
}

fn is_rain_with_fog(r: &Ranking<'_>) -> bool {
    let combined = r.percent_of(Hujan) + r.percent_of(Berkabut) + r.percent_of(Berawan);
    r.in_top(3, &[Hujan, Berawan, Berkabut]) && combined > r.config().rain_fog_percent
}

fn rain_with_fog(r: &Ranking<'_>) -> Verdict {
    Verdict::new(
        RuleKind::RainWithFog,
        "Hujan Disertai Kabut",
        "Hujan Berkabut",
        format!(
            "Terdeteksi kondisi cuaca kompleks yang melibatkan <strong>Hujan</strong> ({}%), \
             <strong>Berkabut</strong> ({}%), dan tutupan awan tebal (<strong>Berawan</strong>, {}%). \
             Ini mengindikasikan hujan dengan jarak pandang rendah.",
            r.percent_of(Hujan),
            r.percent_of(Berkabut),
            r.percent_of(Berawan)
        ),
    )
}

fn is_overcast(r: &Ranking<'_>) -> bool {
    r.top_two_are(Berawan, Hujan)
}

fn overcast(r: &Ranking<'_>) -> Verdict {
    Verdict::new(
        RuleKind::Overcast,
        "Mendung",
        "Mendung",
        format!(
            "Langit yang sangat <strong>Berawan</strong> ({}%) disertai probabilitas <strong>Hujan</strong> \
             yang signifikan ({}%). Ini adalah kondisi mendung dengan potensi hujan.",
            r.percent_of(Berawan),
            r.percent_of(Hujan)
        ),
    )
}

fn is_partly_cloudy(r: &Ranking<'_>) -> bool {
    r.top_two_are(Cerah, Berawan)
}

fn partly_cloudy(r: &Ranking<'_>) -> Verdict {
    Verdict::new(
        RuleKind::PartlyCloudy,
        "Cerah Berawan",
        "Cerah Berawan",
        format!(
            "Gambar ini menunjukkan kondisi campuran antara <strong>Cerah</strong> ({}%) \
             dan <strong>Berawan</strong> ({}%), mengarah pada kesimpulan cuaca cerah berawan.",
            r.percent_of(Cerah),
            r.percent_of(Berawan)
        ),
    )
}

fn is_sunshower(r: &Ranking<'_>) -> bool {
    let third = r.third().map_or(0.0, |t| t.percent);
    r.in_top(3, &[Hujan, Cerah]) && third < r.config().minor_percent
}

fn sunshower(r: &Ranking<'_>) -> Verdict {
    Verdict::new(
        RuleKind::Sunshower,
        "Hujan Cerah (Sunshower)",
        "Hujan Cerah",
        format!(
            "Fenomena unik di mana <strong>Hujan</strong> ({}%) turun saat matahari masih \
             <strong>Cerah</strong> ({}%). Kondisi ini sering disebut sebagai 'sunshower'.",
            r.percent_of(Hujan),
            r.percent_of(Cerah)
        ),
    )
}

/// Fallback: the top class, naming the runner-up when it is significant
pub fn top_class(r: &Ranking<'_>) -> Verdict {
    let top = r.top();
    let secondary = match r.second() {
        Some(second) if second.percent > r.config().minor_percent => format!(
            ", dengan pengaruh sekunder dari kondisi <strong>{}</strong> ({}%)",
            second.class, second.percent
        ),
        _ => String::new(),
    };
    Verdict::new(
        RuleKind::TopClass,
        top.class.name(),
        top.class.name(),
        format!(
            "Kondisi cuaca utama teridentifikasi sebagai <strong>{}</strong> (probabilitas {}%){}.",
            top.class, top.percent, secondary
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[(WeatherClass, f64)]) -> ConfidenceList {
        entries.iter().map(|&(c, p)| ClassConfidence::new(c, p)).collect()
    }

    #[test]
    fn test_ranking_reorders() {
        let config = FusionConfig::default();
        let confidences = list(&[(Cerah, 10.0), (Hujan, 60.0), (Berawan, 30.0)]);
        let ranking = Ranking::new(&confidences, &config).unwrap();
        assert_eq!(ranking.top().class, Hujan);
        assert_eq!(ranking.second().unwrap().class, Berawan);
        assert_eq!(ranking.third().unwrap().class, Cerah);
        assert!(ranking.in_top(2, &[Hujan, Berawan]));
        assert!(!ranking.in_top(2, &[Cerah]));
        assert!(ranking.top_two_are(Berawan, Hujan));
        assert_eq!(ranking.percent_of(Berkabut), 0.0);
    }

    #[test]
    fn test_empty_has_no_ranking() {
        let config = FusionConfig::default();
        assert!(Ranking::new(&ConfidenceList::default(), &config).is_none());
    }

    #[test]
    fn test_fallback_secondary_clause() {
        let config = FusionConfig::default();
        let with = list(&[(Berkabut, 60.0), (Cerah, 30.0), (Hujan, 6.0), (Berawan, 4.0)]);
        let ranking = Ranking::new(&with, &config).unwrap();
        let verdict = top_class(&ranking);
        assert!(verdict.explanation.contains("pengaruh sekunder"));
        assert!(verdict.explanation.contains("<strong>Cerah</strong> (30%)"));

        let without = list(&[(Berkabut, 70.0), (Cerah, 15.0), (Hujan, 10.0), (Berawan, 5.0)]);
        let ranking = Ranking::new(&without, &config).unwrap();
        assert!(!top_class(&ranking).explanation.contains("pengaruh sekunder"));
    }

    #[test]
    fn test_single_entry_guards() {
        let config = FusionConfig::default();
        let single = list(&[(Hujan, 50.0)]);
        let ranking = Ranking::new(&single, &config).unwrap();
        assert!(!is_overcast(&ranking));
        assert!(!is_sunshower(&ranking));
        assert_eq!(top_class(&ranking).prediction, "Hujan");
    }
}
