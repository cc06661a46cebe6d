use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Number of tissue categories the classifier was trained on.
pub const NUM_CLASSES: usize = 4;

/// Lung tissue categories, in the order of the model's output vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum ClassLabel {
    #[strum(serialize = "Adenocarcinoma")]
    Adenocarcinoma,
    #[strum(serialize = "Large Cell Carcinoma")]
    LargeCellCarcinoma,
    #[strum(serialize = "Normal")]
    Normal,
    #[strum(serialize = "Squamous Cell Carcinoma")]
    SquamousCellCarcinoma,
}

impl ClassLabel {
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    pub fn index(self) -> usize {
        match self {
            ClassLabel::Adenocarcinoma => 0,
            ClassLabel::LargeCellCarcinoma => 1,
            ClassLabel::Normal => 2,
            ClassLabel::SquamousCellCarcinoma => 3,
        }
    }

    /// Short description shown in the "About Cancer Types" panel.
    pub fn description(self) -> &'static str {
        match self {
            ClassLabel::Adenocarcinoma => "Most common type, often found in outer lung areas.",
            ClassLabel::LargeCellCarcinoma => "Rare but aggressive.",
            ClassLabel::Normal => "Healthy lung tissue.",
            ClassLabel::SquamousCellCarcinoma => "Linked to smoking, found in central lungs.",
        }
    }
}

/// Outcome of a single classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub probabilities: [f32; NUM_CLASSES],
    pub predicted_class: ClassLabel,
    /// Highest class probability as a percentage.
    pub confidence: f32,
}

impl Prediction {
    /// Picks the most probable class. Ties go to the lowest index.
    pub fn from_probabilities(probabilities: [f32; NUM_CLASSES]) -> Self {
        let mut best_index = 0;
        for (index, &p) in probabilities.iter().enumerate().skip(1) {
            if p > probabilities[best_index] {
                best_index = index;
            }
        }

        Self {
            probabilities,
            predicted_class: ClassLabel::from_index(best_index)
                .unwrap_or(ClassLabel::Adenocarcinoma),
            confidence: probabilities[best_index] * 100.0,
        }
    }

    pub fn is_normal(&self) -> bool {
        self.predicted_class == ClassLabel::Normal
    }

    pub fn confidence_display(&self) -> String {
        format!("{:.2}%", self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_table_is_fixed() {
        let labels: Vec<String> = ClassLabel::iter().map(|l| l.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "Adenocarcinoma",
                "Large Cell Carcinoma",
                "Normal",
                "Squamous Cell Carcinoma"
            ]
        );
        for label in ClassLabel::iter() {
            assert_eq!(ClassLabel::from_index(label.index()), Some(label));
        }
        assert_eq!(ClassLabel::from_index(NUM_CLASSES), None);
    }

    #[test]
    fn unique_maximum_wins() {
        for i in 0..NUM_CLASSES {
            let mut probs = [0.1f32; NUM_CLASSES];
            probs[i] = 0.7;
            let prediction = Prediction::from_probabilities(probs);
            assert_eq!(prediction.predicted_class.index(), i);
        }
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let prediction = Prediction::from_probabilities([0.1, 0.4, 0.1, 0.4]);
        assert_eq!(prediction.predicted_class, ClassLabel::LargeCellCarcinoma);

        let prediction = Prediction::from_probabilities([0.25; NUM_CLASSES]);
        assert_eq!(prediction.predicted_class, ClassLabel::Adenocarcinoma);
    }

    #[test]
    fn confidence_is_max_probability_percent() {
        let prediction = Prediction::from_probabilities([0.01, 0.02, 0.96, 0.01]);
        assert_eq!(prediction.predicted_class, ClassLabel::Normal);
        assert!(prediction.is_normal());
        assert!((prediction.confidence - 96.0).abs() < 1e-4);
        assert!((0.0..=100.0).contains(&prediction.confidence));
        assert_eq!(prediction.confidence_display(), "96.00%");
    }

    #[test]
    fn certain_prediction_is_full_confidence() {
        let prediction = Prediction::from_probabilities([0.0, 0.0, 0.0, 1.0]);
        assert_eq!(prediction.predicted_class, ClassLabel::SquamousCellCarcinoma);
        assert_eq!(prediction.confidence_display(), "100.00%");
        assert!(!prediction.is_normal());
    }
}
