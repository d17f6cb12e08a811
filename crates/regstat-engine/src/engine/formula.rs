//! Formula parsing and evaluation.
//!
//! Statement formulas are flat additive expressions over row ids:
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := rowId
//! rowId := [A-Za-z]+[0-9]+
//! ```
//!
//! There are no parentheses, literals or functions. A formula is parsed once
//! into a list of `(operator, row id)` terms and folded left to right when
//! evaluated. Row ids never contain `+` or `-`, so splitting on the operators
//! is unambiguous.

use serde::Serialize;
use std::fmt;

use super::error::{FormulaError, RowError};
use super::row_id::RowId;

/// Sign applied to a term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Op {
    Add,
    Sub,
}

impl Op {
    fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
        }
    }
}

/// One signed operand of a formula.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Term {
    pub op: Op,
    pub row: RowId,
}

/// A parsed formula. The first term is always `Op::Add`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Formula {
    terms: Vec<Term>,
}

impl Formula {
    /// Parse formula text such as `"C18+C19+C20+C21-C22"`.
    ///
    /// Whitespace around operands is ignored. A leading sign, an empty operand
    /// or an operand that is not a row id is rejected.
    pub fn parse(text: &str) -> Result<Formula, FormulaError> {
        let tokens = tokenize(text)?;
        let mut terms = Vec::with_capacity(tokens.len());
        for (op, token) in tokens {
            let row = RowId::parse(token).map_err(|_| FormulaError::InvalidToken {
                token: token.to_string(),
            })?;
            terms.push(Term { op, row });
        }
        Ok(Formula { terms })
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Row ids referenced by this formula, in order of appearance.
    pub fn references(&self) -> impl Iterator<Item = &RowId> {
        self.terms.iter().map(|t| &t.row)
    }

    /// Fold the terms left to right using `lookup` for each operand.
    ///
    /// The first failing lookup aborts evaluation.
    pub fn eval<F>(&self, mut lookup: F) -> Result<f64, RowError>
    where
        F: FnMut(&RowId) -> Result<f64, RowError>,
    {
        let mut acc = 0.0;
        for (i, term) in self.terms.iter().enumerate() {
            let value = lookup(&term.row)?;
            acc = match (i, term.op) {
                (0, _) => value,
                (_, Op::Add) => acc + value,
                (_, Op::Sub) => acc - value,
            };
        }
        Ok(acc)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", term.op.symbol())?;
            }
            write!(f, "{}", term.row)?;
        }
        Ok(())
    }
}

/// Split formula text on `+`/`-`, keeping the operator that precedes each
/// operand. Operands are returned trimmed but otherwise unvalidated.
fn tokenize(text: &str) -> Result<Vec<(Op, &str)>, FormulaError> {
    if text.trim().is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut tokens = Vec::new();
    let mut op = Op::Add;
    let mut start = 0;
    for (pos, ch) in text.char_indices() {
        let next_op = match ch {
            '+' => Op::Add,
            '-' => Op::Sub,
            _ => continue,
        };
        let operand = text[start..pos].trim();
        if operand.is_empty() {
            return Err(FormulaError::MissingOperand { position: pos });
        }
        tokens.push((op, operand));
        op = next_op;
        start = pos + 1;
    }

    let last = text[start..].trim();
    if last.is_empty() {
        return Err(FormulaError::MissingOperand {
            position: text.len(),
        });
    }
    tokens.push((op, last));
    Ok(tokens)
}

/// Evaluate formula text directly.
///
/// Parse failures are reported as a reference error against `owner`, the row
/// the formula belongs to. `lookup` decides how operands resolve; returning a
/// [`RowError::Reference`] from it flags ids the caller does not know.
pub fn evaluate<F>(formula: &str, owner: &RowId, lookup: F) -> Result<f64, RowError>
where
    F: FnMut(&RowId) -> Result<f64, RowError>,
{
    let parsed = Formula::parse(formula).map_err(|e| RowError::Reference {
        row: owner.clone(),
        token: match e {
            FormulaError::InvalidToken { token } => token,
            _ => formula.to_string(),
        },
    })?;
    parsed.eval(lookup)
}
