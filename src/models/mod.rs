//! IAM model implementations and the model library.
//!
//! Models are small, stateless values behind the `IamModel` trait so the
//! fitting code can stay generic over them.

pub mod model;

pub use model::*;

use crate::domain::ModelSpec;
use crate::error::AnalysisError;

/// An ordered set of models to fit, built explicitly by the caller.
pub struct ModelLibrary {
    models: Vec<Box<dyn IamModel>>,
}

impl ModelLibrary {
    pub fn from_specs(specs: &[ModelSpec]) -> Result<Self, AnalysisError> {
        let models = specs
            .iter()
            .map(|&s| build_model(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { models })
    }

    pub fn models(&self) -> &[Box<dyn IamModel>] {
        &self.models
    }

    pub fn get(&self, name: &str) -> Option<&dyn IamModel> {
        self.models.iter().find(|m| m.name() == name).map(|m| m.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelLibrary {
    /// ASHRAE, Physical and degree-4 Polynomial.
    fn default() -> Self {
        Self {
            models: vec![
                Box::new(Ashrae),
                Box::new(Physical),
                Box::new(Polynomial { degree: 4 }),
            ],
        }
    }
}

impl std::fmt::Debug for ModelLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLibrary").field("models", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_library_matches_default_specs() {
        let lib = ModelLibrary::default();
        let from_specs = ModelLibrary::from_specs(&ModelSpec::default_set()).unwrap();
        assert_eq!(lib.names(), from_specs.names());
        assert_eq!(lib.names(), vec!["ashrae", "physical", "polynomial_4"]);
    }

    #[test]
    fn lookup_by_name() {
        let lib = ModelLibrary::default();
        assert!(lib.get("physical").is_some());
        assert!(lib.get("polynomial_2").is_none());
    }
}
