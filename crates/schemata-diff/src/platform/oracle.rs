//! Effect oracles decide whether a column property difference matters

use schemata_core::{Column, ColumnProperty};
use thiserror::Error;

use super::renderer::{ColumnRenderer, RenderError};

/// Errors raised by an effect oracle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The column declaration could not be rendered
    #[error("cannot render column declaration: {0}")]
    Render(#[from] RenderError),
    /// Failure reported by a caller supplied oracle
    #[error("{0}")]
    Other(String),
}

/// Decides whether two columns that differ in one property would produce a
/// different column on the target platform.
///
/// The comparator calls this once per raw property difference, with `a` being
/// the new column carrying the old value of `property` and `b` the new column.
pub trait ColumnEffectOracle {
    fn renders_differently(
        &self,
        property: &ColumnProperty,
        a: &Column,
        b: &Column,
    ) -> Result<bool, OracleError>;
}

/// Platform agnostic oracle: every metadata difference is significant
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataOracle;

impl ColumnEffectOracle for MetadataOracle {
    fn renders_differently(
        &self,
        property: &ColumnProperty,
        a: &Column,
        b: &Column,
    ) -> Result<bool, OracleError> {
        Ok(a.property_differs(property, b))
    }
}

/// Compares rendered column declarations.
///
/// Comments are compared separately when the renderer does not put them in
/// the declaration, because they still require a statement of their own.
#[derive(Debug, Clone)]
pub struct DeclarationOracle<R> {
    renderer: R,
}

impl<R: ColumnRenderer> DeclarationOracle<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

impl<R: ColumnRenderer> ColumnEffectOracle for DeclarationOracle<R> {
    fn renders_differently(
        &self,
        _property: &ColumnProperty,
        a: &Column,
        b: &Column,
    ) -> Result<bool, OracleError> {
        if self.renderer.column_declaration(a)? != self.renderer.column_declaration(b)? {
            return Ok(true);
        }
        Ok(!self.renderer.supports_inline_comments()
            && a.effective_comment() != b.effective_comment())
    }
}

impl<T: ColumnEffectOracle + ?Sized> ColumnEffectOracle for &T {
    fn renders_differently(
        &self,
        property: &ColumnProperty,
        a: &Column,
        b: &Column,
    ) -> Result<bool, OracleError> {
        (**self).renders_differently(property, a, b)
    }
}
