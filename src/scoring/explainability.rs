// Explainability module
// Turns score components into a human-readable reason for the verdict

use crate::analysis::Analyzer;
use crate::scoring::types::{Classification, ScoreComponents};

pub const INSUFFICIENT_SIGNAL: &str =
    "Insufficient signal for analysis: the audio is silent or too short to measure voice characteristics";

pub const BORDERLINE: &str =
    "Borderline aggregate: several near-threshold cues together suggest synthetic voice generation";

/// How many low-suspicion analyzers a HUMAN explanation names
const NATURAL_CUES: usize = 3;

/// What a triggered analyzer observed. Each phrase names only its own subject.
pub fn cue_description(analyzer: Analyzer) -> &'static str {
    match analyzer {
        Analyzer::Pitch => "unnaturally consistent pitch",
        Analyzer::Spectral => "uniform spectral characteristics",
        Analyzer::Cepstral => "static timbre (low MFCC variance)",
        Analyzer::Energy => "unnaturally steady volume",
        Analyzer::Harmonic => "atypical harmonic-to-noise balance",
        Analyzer::Statistical => "idealized amplitude distribution",
    }
}

/// Natural-sounding counterpart used when an analyzer saw nothing suspicious
pub fn natural_description(analyzer: Analyzer) -> &'static str {
    match analyzer {
        Analyzer::Pitch => "pitch movement",
        Analyzer::Spectral => "spectral shape",
        Analyzer::Cepstral => "timbre",
        Analyzer::Energy => "loudness dynamics",
        Analyzer::Harmonic => "harmonic balance",
        Analyzer::Statistical => "amplitude distribution",
    }
}

/// Explanation when too few analyzers measured the audio to trust the score
pub fn insufficient_evidence(components: &ScoreComponents) -> String {
    let measured = components.measured_count();
    if measured == 0 {
        return INSUFFICIENT_SIGNAL.to_string();
    }
    format!(
        "Insufficient signal for analysis: only {} of {} voice characteristics could be measured, \
         the audio is likely too short",
        measured,
        components.len()
    )
}

/// Explanation text for a verdict
pub fn build_explanation(components: &ScoreComponents, classification: Classification) -> String {
    if components.all_indeterminate() {
        return INSUFFICIENT_SIGNAL.to_string();
    }

    let triggered = components.triggered();
    let cues: Vec<&str> = triggered.iter().map(|&a| cue_description(a)).collect();

    match classification {
        Classification::AiGenerated if cues.is_empty() => BORDERLINE.to_string(),
        Classification::AiGenerated => format!(
            "Detected {} indicating synthetic voice generation",
            cues.join(", ")
        ),
        Classification::Human if cues.is_empty() => format!(
            "Natural vocal variation observed in {}",
            least_suspicious(components).join(", ")
        ),
        Classification::Human => format!(
            "Natural vocal variation outweighs isolated synthetic cues: {}",
            cues.join(", ")
        ),
    }
}

/// Up to three measured analyzers with the lowest suspicion, ties in priority order
fn least_suspicious(components: &ScoreComponents) -> Vec<&'static str> {
    let mut measured: Vec<(Analyzer, f64)> = Analyzer::ALL
        .into_iter()
        .filter_map(|a| components.get(a))
        .filter(|c| !c.is_indeterminate())
        .map(|c| (c.analyzer, c.suspicion()))
        .collect();

    // Stable sort keeps priority order among equals
    measured.sort_by(|a, b| a.1.total_cmp(&b.1));

    measured
        .into_iter()
        .take(NATURAL_CUES)
        .map(|(a, _)| natural_description(a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::ComponentScore;

    fn component(analyzer: Analyzer, value: Option<f64>, suspicion: f64, triggered: bool) -> ComponentScore {
        let signal = analyzer.signals()[0];
        ComponentScore {
            analyzer,
            signal,
            value,
            weight: 0.1,
            contribution: 0.1 * suspicion,
            triggered,
        }
    }

    fn only_pitch_triggered() -> ScoreComponents {
        ScoreComponents::new(
            Analyzer::ALL
                .into_iter()
                .map(|a| {
                    let hit = a == Analyzer::Pitch;
                    component(a, Some(1.0), if hit { 1.0 } else { 0.0 }, hit)
                })
                .collect(),
        )
    }

    /// Keywords that identify each analyzer's subject
    fn subject_words(analyzer: Analyzer) -> &'static [&'static str] {
        match analyzer {
            Analyzer::Pitch => &["pitch"],
            Analyzer::Spectral => &["spectral"],
            Analyzer::Cepstral => &["timbre", "MFCC"],
            Analyzer::Energy => &["volume", "loudness"],
            Analyzer::Harmonic => &["harmonic"],
            Analyzer::Statistical => &["amplitude"],
        }
    }

    #[test]
    fn test_descriptions_stay_on_subject() {
        for analyzer in Analyzer::ALL {
            for other in Analyzer::ALL.into_iter().filter(|&o| o != analyzer) {
                for word in subject_words(other) {
                    assert!(!cue_description(analyzer).contains(word));
                    assert!(!natural_description(analyzer).contains(word));
                }
            }
        }
    }

    #[test]
    fn test_pitch_only_ai() {
        let text = build_explanation(&only_pitch_triggered(), Classification::AiGenerated);

        assert!(text.contains("pitch"));
        for other in Analyzer::ALL.into_iter().filter(|&a| a != Analyzer::Pitch) {
            for word in subject_words(other) {
                assert!(!text.contains(word), "{:?} mentions {}", text, word);
            }
        }
    }

    #[test]
    fn test_pitch_only_human() {
        let text = build_explanation(&only_pitch_triggered(), Classification::Human);
        assert!(text.starts_with("Natural vocal variation outweighs"));
        assert!(text.contains(cue_description(Analyzer::Pitch)));
        assert!(!text.contains("spectral"));
    }

    #[test]
    fn test_priority_order() {
        let components = ScoreComponents::new(vec![
            component(Analyzer::Statistical, Some(0.0), 1.0, true),
            component(Analyzer::Energy, Some(1.0), 1.0, true),
            component(Analyzer::Spectral, Some(0.0), 1.0, true),
        ]);
        let text = build_explanation(&components, Classification::AiGenerated);

        assert_eq!(
            text,
            "Detected uniform spectral characteristics, unnaturally steady volume, \
             idealized amplitude distribution indicating synthetic voice generation"
        );
    }

    #[test]
    fn test_borderline_fallback() {
        let components = ScoreComponents::new(
            Analyzer::ALL
                .into_iter()
                .map(|a| component(a, Some(1.0), 0.6, false))
                .collect(),
        );
        assert_eq!(
            build_explanation(&components, Classification::AiGenerated),
            BORDERLINE
        );
    }

    #[test]
    fn test_human_names_least_suspicious() {
        let components = ScoreComponents::new(vec![
            component(Analyzer::Pitch, Some(1.0), 0.4, false),
            component(Analyzer::Spectral, Some(1.0), 0.0, false),
            component(Analyzer::Cepstral, None, 0.0, false),
            component(Analyzer::Energy, Some(1.0), 0.1, false),
            component(Analyzer::Harmonic, Some(1.0), 0.0, false),
            component(Analyzer::Statistical, Some(1.0), 0.9, false),
        ]);
        let text = build_explanation(&components, Classification::Human);

        assert_eq!(
            text,
            "Natural vocal variation observed in spectral shape, harmonic balance, loudness dynamics"
        );
    }

    #[test]
    fn test_insufficient_signal() {
        let components = ScoreComponents::new(
            Analyzer::ALL
                .into_iter()
                .map(|a| component(a, None, 0.0, false))
                .collect(),
        );
        for classification in [Classification::AiGenerated, Classification::Human] {
            assert_eq!(build_explanation(&components, classification), INSUFFICIENT_SIGNAL);
        }
    }

    #[test]
    fn test_insufficient_evidence_counts_measured() {
        let components = ScoreComponents::new(
            Analyzer::ALL
                .into_iter()
                .map(|a| {
                    let measured = matches!(a, Analyzer::Harmonic | Analyzer::Statistical);
                    component(a, measured.then_some(0.0), 1.0, measured)
                })
                .collect(),
        );
        let text = insufficient_evidence(&components);
        assert!(text.starts_with("Insufficient signal for analysis"));
        assert!(text.contains("only 2 of 6"));

        let silent = ScoreComponents::new(
            Analyzer::ALL
                .into_iter()
                .map(|a| component(a, None, 0.0, false))
                .collect(),
        );
        assert_eq!(insufficient_evidence(&silent), INSUFFICIENT_SIGNAL);
    }
}
