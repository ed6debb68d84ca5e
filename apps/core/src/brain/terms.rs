//! Health term dictionary.
//!
//! Categorized lowercase keywords. A message containing any of them as a
//! substring is considered health related.

use std::sync::LazyLock;

/// One category of the dictionary.
#[derive(Debug, Clone, Copy)]
pub struct TermCategory {
    pub category: &'static str,
    pub terms: &'static [&'static str],
}

pub const GENERAL_HEALTH: TermCategory = TermCategory {
    category: "general_health",
    terms: &[
        "health",
        "healthy",
        "medical",
        "medicine",
        "doctor",
        "physician",
        "nurse",
        "hospital",
        "clinic",
        "patient",
        "symptom",
        "diagnosis",
        "treatment",
        "therapy",
        "checkup",
        "check-up",
        "wellness",
        "wellbeing",
        "well-being",
        "illness",
        "sick",
        "pain",
        "ache",
        "fever",
        "injury",
        "recovery",
        "vaccine",
        "vaccination",
        "immunity",
        "prescription",
        "appointment",
        "lab report",
        "lab result",
        "test result",
    ],
};

pub const ANATOMY: TermCategory = TermCategory {
    category: "anatomy",
    terms: &[
        "heart",
        "lung",
        "liver",
        "kidney",
        "stomach",
        "brain",
        "skin",
        "bone",
        "muscle",
        "joint",
        "blood",
        "throat",
        "spine",
        "nerve",
        "thyroid",
        "pancreas",
        "intestine",
        "bladder",
        "artery",
        "vein",
        "tooth",
        "teeth",
        "gums",
    ],
};

pub const CONDITIONS: TermCategory = TermCategory {
    category: "conditions",
    terms: &[
        "headache",
        "migraine",
        "nausea",
        "vomit",
        "diarrhea",
        "constipation",
        "cough",
        "sneez",
        "rash",
        "allergy",
        "allergic",
        "inflammation",
        "infection",
        "swelling",
        "fatigue",
        "dizz",
        "insomnia",
        "bloating",
        "cramp",
        "sore",
        "bruise",
        "fracture",
        "sprain",
    ],
};

pub const METRICS: TermCategory = TermCategory {
    category: "metrics",
    terms: &[
        "blood pressure",
        "pressure",
        "heart rate",
        "pulse",
        "cholesterol",
        "glucose",
        "blood sugar",
        "sugar level",
        "bmi",
        "body mass",
        "weight",
        "temperature",
        "oxygen",
        "saturation",
        "hemoglobin",
        "a1c",
        "triglyceride",
        "systolic",
        "diastolic",
        "mmhg",
        "mg/dl",
        "mmol",
    ],
};

pub const NUTRITION: TermCategory = TermCategory {
    category: "nutrition",
    terms: &[
        "nutrition",
        "diet",
        "calorie",
        "protein",
        "carbohydrate",
        "carbs",
        "vitamin",
        "mineral",
        "fiber",
        "sodium",
        "potassium",
        "iron",
        "calcium",
        "meal",
        "fasting",
        "hydration",
        "vegetable",
        "fruit",
        "supplement",
    ],
};

pub const FITNESS: TermCategory = TermCategory {
    category: "fitness",
    terms: &[
        "exercise",
        "workout",
        "fitness",
        "cardio",
        "stretching",
        "yoga",
        "running",
        "walking",
        "jogging",
        "strength training",
        "physical activity",
        "steps",
        "endurance",
    ],
};

pub const MENTAL_HEALTH: TermCategory = TermCategory {
    category: "mental_health",
    terms: &[
        "mental",
        "stress",
        "anxiety",
        "anxious",
        "depression",
        "depressed",
        "mood",
        "panic",
        "trauma",
        "burnout",
        "therapist",
        "counseling",
        "mindfulness",
        "sleep",
    ],
};

pub const MEDICATIONS: TermCategory = TermCategory {
    category: "medications",
    terms: &[
        "medication",
        "medicine",
        "drug",
        "pill",
        "tablet",
        "capsule",
        "dose",
        "dosage",
        "side effect",
        "antibiotic",
        "painkiller",
        "ibuprofen",
        "paracetamol",
        "acetaminophen",
        "aspirin",
        "insulin",
        "metformin",
        "statin",
        "antidepressant",
        "inhaler",
    ],
};

pub const SPECIALTIES: TermCategory = TermCategory {
    category: "specialties",
    terms: &[
        "cardiolog",
        "dermatolog",
        "neurolog",
        "pediatric",
        "psychiatr",
        "psycholog",
        "orthoped",
        "gynecolog",
        "oncolog",
        "endocrinolog",
        "gastroenterolog",
        "ophthalmolog",
        "urolog",
        "radiolog",
        "dentist",
        "surgeon",
        "surgery",
    ],
};

pub const DISEASES: TermCategory = TermCategory {
    category: "diseases",
    terms: &[
        "diabetes",
        "diabetic",
        "hypertension",
        "asthma",
        "cancer",
        "tumor",
        "arthritis",
        "covid",
        "influenza",
        "flu",
        "pneumonia",
        "bronchitis",
        "anemia",
        "obesity",
        "stroke",
        "alzheimer",
        "dementia",
        "epilepsy",
        "hepatitis",
        "tuberculosis",
        "osteoporosis",
        "eczema",
        "psoriasis",
    ],
};

/// All categories, in lookup order.
pub const DICTIONARY: &[TermCategory] = &[
    GENERAL_HEALTH,
    ANATOMY,
    CONDITIONS,
    METRICS,
    NUTRITION,
    FITNESS,
    MENTAL_HEALTH,
    MEDICATIONS,
    SPECIALTIES,
    DISEASES,
];

/// Flattened, deduplicated keyword list.
pub static ALL_TERMS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut terms: Vec<&'static str> = Vec::new();
    for category in DICTIONARY {
        for term in category.terms {
            if !terms.contains(term) {
                terms.push(term);
            }
        }
    }
    terms
});

/// First dictionary keyword contained in `lowercase_text`.
pub fn find_term(lowercase_text: &str) -> Option<&'static str> {
    ALL_TERMS
        .iter()
        .copied()
        .find(|term| lowercase_text.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_are_lowercase_and_trimmed() {
        for term in ALL_TERMS.iter() {
            assert_eq!(*term, term.to_lowercase(), "'{}' must be lowercase", term);
            assert_eq!(*term, term.trim(), "'{}' must be trimmed", term);
            assert!(!term.is_empty());
        }
    }

    #[test]
    fn test_flattening_removes_duplicates() {
        // "medicine" is listed under two categories.
        let count = ALL_TERMS.iter().filter(|t| **t == "medicine").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_find_term_substring() {
        assert_eq!(find_term("she has asthma"), Some("asthma"));
        assert!(find_term("what is a normal blood pressure").is_some());
        assert_eq!(find_term("what is a normal bitcoin price"), None);
        assert_eq!(find_term("bp 120"), None);
    }
}
