//! Federation runtime seam.
//!
//! The configuration model never talks to an RTI directly. `initialize()`
//! hands the frozen declaration to whatever implements this trait: a real
//! RTI binding, the loopback runtime in the federate crate, or a simulated
//! federation in tests.

use crate::federate::FederateDeclaration;

/// Accepts federate declarations.
pub trait FederationRuntime {
    /// Why a declaration was refused.
    type Error: std::error::Error;

    /// Submit a fully validated declaration.
    ///
    /// Called at most once per successful `initialize()`. An error leaves
    /// the submitting configuration unfrozen.
    fn submit(&mut self, declaration: &FederateDeclaration) -> Result<(), Self::Error>;
}

impl<R: FederationRuntime + ?Sized> FederationRuntime for &mut R {
    type Error = R::Error;

    fn submit(&mut self, declaration: &FederateDeclaration) -> Result<(), Self::Error> {
        (**self).submit(declaration)
    }
}
