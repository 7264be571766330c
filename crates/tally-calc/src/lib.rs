//! Four-function calculator state machine.
//!
//! A [`Calculator`] models one button-driven calculator: digits build up a
//! display, an operator freezes the first operand, more digits build the
//! second operand and `=` evaluates. Numbers are arbitrary-precision
//! decimals, and results are rendered without a trailing `.0`.
//!
//! # Example
//!
//! ```rust
//! use tally_calc::{Calculator, Operator};
//!
//! let mut calc = Calculator::new();
//! calc.process_operand('5').unwrap();
//! calc.process_operator(Operator::Add.symbol()).unwrap();
//! calc.process_operand('3').unwrap();
//! calc.process_operator('=').unwrap();
//! assert_eq!(calc.display(), "8");
//! ```

mod calculator;
mod error;
mod number;

pub use calculator::{Calculator, Operator, Phase};
pub use error::{Error, Result};
pub use number::format_decimal;
