#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::study::{
        DemographicSelection, DependentVariable, ExperimentalDesign, Item, MeasureSource,
        Operationalization, StudySpec,
    };

    /// A measure with one item per statement.
    pub fn measure(scale_name: &str, statements: &[&str]) -> Operationalization {
        Operationalization {
            scale_name: scale_name.to_string(),
            items: statements.iter().map(|s| Item::new(s)).collect(),
            source: MeasureSource::FreeText,
            scale: None,
        }
    }

    pub fn dependent_variable(id: &str, name: &str, measures: Vec<Operationalization>) -> DependentVariable {
        DependentVariable {
            id: id.to_string(),
            name: name.to_string(),
            operationalizations: measures,
        }
    }

    /// Non-experimental study: two demographics and one three-item measure.
    pub fn minimal_study() -> StudySpec {
        StudySpec {
            description: Some("How sleep quality relates to next-day mood.".to_string()),
            demographics: vec![
                DemographicSelection::numeric("age", Some(18), Some(99)),
                DemographicSelection::multiple_choice("gender", &["Female", "Male", "Non-binary"]),
            ],
            dependent_variables: vec![dependent_variable(
                "mood",
                "Mood",
                vec![measure(
                    "Mood Scale",
                    &["I feel cheerful", "I feel calm", "I feel energetic"],
                )],
            )],
            ..StudySpec::titled("Sleep and Mood")
        }
    }

    /// Two-condition experiment with one measure.
    pub fn experimental_study() -> StudySpec {
        StudySpec {
            design: Some(ExperimentalDesign::experimental(&["control", "treatment"])),
            ..minimal_study()
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_minimal_study() {
        let study = minimal_study();
        assert_eq!(study.survey_title(), "Sleep and Mood");
        assert!(!study.is_experimental());
        assert!(study.dependent_variables[0].is_measurable());
    }

    #[test]
    fn test_fixtures_experimental_study() {
        let study = experimental_study();
        assert!(study.is_experimental());
        assert_eq!(study.conditions(), ["control", "treatment"]);
    }
}
