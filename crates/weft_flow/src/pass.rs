//! The pass trait and prerequisite checking.

use crate::error::PassError;
use weft_arch::{ArchitectureContext, Artifact, Facet, FacetSet};
use weft_diagnostics::DiagnosticSink;

/// A transformation step of a [`Flow`](crate::Flow).
///
/// A pass declares which facets must already be complete (`requires`), which
/// it completes (`produces`) and which must not be complete yet (`forbids`).
/// The flow checks these before calling [`run`](Pass::run) and marks the
/// produced facets complete afterwards.
///
/// Implementations compute their results first and write them into the
/// context at the end, so a failing pass leaves the context untouched.
pub trait Pass: Send + Sync {
    /// The pass name, as used in `weft.toml`.
    fn name(&self) -> &'static str;

    /// Facets that must be complete before the pass runs.
    fn requires(&self) -> &'static [Facet] {
        &[]
    }

    /// Facets the pass completes.
    fn produces(&self) -> &'static [Facet];

    /// Facets that must not be complete when the pass runs.
    fn forbids(&self) -> &'static [Facet] {
        &[]
    }

    /// Runs the pass, returning the files it wrote.
    fn run(
        &self,
        ctx: &mut ArchitectureContext,
        sink: &DiagnosticSink,
    ) -> Result<Vec<Artifact>, PassError>;
}

/// Checks a pass's declarations against the completed facets.
pub fn check_prerequisites(pass: &dyn Pass, facets: &FacetSet) -> Result<(), PassError> {
    if let Some(&facet) = pass.requires().iter().find(|f| !facets.contains(**f)) {
        return Err(PassError::UnmetPassPrerequisite {
            pass: pass.name().to_string(),
            facet,
        });
    }
    if let Some(&facet) = pass
        .forbids()
        .iter()
        .chain(pass.produces())
        .find(|f| facets.contains(**f))
    {
        return Err(PassError::PassOrderViolation {
            pass: pass.name().to_string(),
            facet,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Pass for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn requires(&self) -> &'static [Facet] {
            &[Facet::Connections]
        }

        fn produces(&self) -> &'static [Facet] {
            &[Facet::ConfigCircuitry]
        }

        fn forbids(&self) -> &'static [Facet] {
            &[Facet::Physical]
        }

        fn run(
            &self,
            _ctx: &mut ArchitectureContext,
            _sink: &DiagnosticSink,
        ) -> Result<Vec<Artifact>, PassError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn missing_requirement() {
        let err = check_prerequisites(&Probe, &FacetSet::new()).unwrap_err();
        assert!(matches!(
            err,
            PassError::UnmetPassPrerequisite {
                facet: Facet::Connections,
                ..
            }
        ));
    }

    #[test]
    fn forbidden_facet() {
        let facets: FacetSet = [Facet::Connections, Facet::Physical].into_iter().collect();
        let err = check_prerequisites(&Probe, &facets).unwrap_err();
        assert!(matches!(
            err,
            PassError::PassOrderViolation {
                facet: Facet::Physical,
                ..
            }
        ));
    }

    #[test]
    fn already_produced() {
        let facets: FacetSet = [Facet::Connections, Facet::ConfigCircuitry].into_iter().collect();
        let err = check_prerequisites(&Probe, &facets).unwrap_err();
        assert!(matches!(
            err,
            PassError::PassOrderViolation {
                facet: Facet::ConfigCircuitry,
                ..
            }
        ));
    }

    #[test]
    fn satisfied() {
        let facets: FacetSet = [Facet::Connections].into_iter().collect();
        check_prerequisites(&Probe, &facets).unwrap();
    }
}
