//! Calculator state machine.

use std::fmt;

use bigdecimal::BigDecimal;
use num_traits::Zero;
use tracing::trace;

use crate::error::{Error, Result};
use crate::number::{divide, floored_rem, format_decimal, parse_display};

/// Display texts left behind by an invalid division; the next digit
/// starts over from a fresh calculator.
const SENTINELS: [&str; 4] = ["NaN", "Inf", "+Inf", "-Inf"];

/// Binary operators the calculator can hold pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Modulo,
    Divide,
    Multiply,
    Subtract,
    Add,
}

impl Operator {
    /// Look up an operator by its key symbol (`% / * - +`).
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '%' => Some(Self::Modulo),
            '/' => Some(Self::Divide),
            '*' => Some(Self::Multiply),
            '-' => Some(Self::Subtract),
            '+' => Some(Self::Add),
            _ => None,
        }
    }

    /// The key symbol for this operator.
    pub fn symbol(self) -> char {
        match self {
            Self::Modulo => '%',
            Self::Divide => '/',
            Self::Multiply => '*',
            Self::Subtract => '-',
            Self::Add => '+',
        }
    }

    fn apply(self, lhs: &BigDecimal, rhs: &BigDecimal) -> Result<BigDecimal> {
        match self {
            Self::Add => Ok(lhs + rhs),
            Self::Subtract => Ok(lhs - rhs),
            Self::Multiply => Ok(lhs * rhs),
            Self::Divide if rhs.is_zero() => Err(Error::DivisionByZero),
            Self::Divide => Ok(divide(lhs, rhs)),
            Self::Modulo if rhs.is_zero() => Err(Error::DivisionByZero),
            Self::Modulo => Ok(floored_rem(lhs, rhs)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Where the calculator is in an `a <op> b =` sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No operator; the display holds the first operand (or a result).
    Entry,
    /// An operator is recorded but the second operand has not started.
    OperatorPending,
    /// The display holds the second operand being typed.
    SecondOperand,
}

/// One four-function calculator.
///
/// Invariants: the display is never empty and holds at most one `.`; the
/// second operand slot is filled only once an operator is pending and a
/// further digit has arrived. Every method that returns an error leaves
/// the calculator exactly as it was.
#[derive(Debug, Clone)]
pub struct Calculator {
    display: String,
    operands: [Option<BigDecimal>; 2],
    operator: Option<Operator>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    /// Create a calculator showing `"0"` with nothing pending.
    pub fn new() -> Self {
        Self {
            display: "0".to_string(),
            operands: [None, None],
            operator: None,
        }
    }

    /// Current display text.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Pending operator, if any.
    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    /// Current phase of the entry sequence.
    pub fn phase(&self) -> Phase {
        match (self.operator, &self.operands[1]) {
            (None, _) => Phase::Entry,
            (Some(_), None) => Phase::OperatorPending,
            (Some(_), Some(_)) => Phase::SecondOperand,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed a digit `0-9` or the decimal point.
    ///
    /// A second `.` is rejected. The first digit after an operator starts a
    /// fresh display for the second operand.
    pub fn process_operand(&mut self, token: char) -> Result<()> {
        let accepted = token.is_ascii_digit() || (token == '.' && !self.display.contains('.'));
        if !accepted {
            return Err(Error::Unsupported(format!("operand {token:?}")));
        }

        if SENTINELS.contains(&self.display.as_str()) {
            self.reset();
        }

        if self.phase() == Phase::OperatorPending {
            self.display = "0".to_string();
            self.operands[1] = Some(BigDecimal::zero());
        }

        if self.display == "0" && token != '.' {
            self.display = token.to_string();
        } else {
            self.display.push(token);
        }
        Ok(())
    }

    /// Feed an operator key.
    ///
    /// `C` clears the display, `T` toggles its sign, `=` evaluates, and
    /// `% / * - +` record a pending operation. `AC` is not a key here:
    /// callers replace the calculator with [`Calculator::new`] instead.
    pub fn process_operator(&mut self, token: char) -> Result<()> {
        match token {
            'C' => {
                self.display = "0".to_string();
                Ok(())
            }
            'T' => {
                self.toggle_sign();
                Ok(())
            }
            '=' => self.evaluate(),
            _ => {
                let operator = Operator::from_symbol(token)
                    .ok_or_else(|| Error::Unsupported(format!("operator {token:?}")))?;
                if let Some(pending) = self.operator {
                    return Err(Error::Unsupported(format!(
                        "operator {token:?} while {pending} is pending"
                    )));
                }

                let operand = parse_display(&self.display)
                    .ok_or_else(|| Error::Unsupported(format!("display {:?}", self.display)))?;
                self.operands[0] = Some(operand);
                self.operator = Some(operator);
                Ok(())
            }
        }
    }

    fn toggle_sign(&mut self) {
        if self.display == "0" {
            return;
        }
        match self.display.strip_prefix('-') {
            Some(rest) => self.display = rest.to_string(),
            None => self.display.insert(0, '-'),
        }
    }

    fn evaluate(&mut self) -> Result<()> {
        let (Some(operator), Some(lhs), Some(_)) =
            (self.operator, &self.operands[0], &self.operands[1])
        else {
            return Err(Error::Unsupported(
                "evaluation without a second operand".to_string(),
            ));
        };

        let rhs = parse_display(&self.display)
            .ok_or_else(|| Error::Unsupported(format!("display {:?}", self.display)))?;
        let result = operator.apply(lhs, &rhs)?;
        let text = format_decimal(&result);

        trace!(operator = %operator, result = %text, "Evaluated");

        self.reset();
        self.display = text;
        Ok(())
    }
}
