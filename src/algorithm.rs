//! The dynamic configuration surface shared by the miner and the verifier.
//!
//! Embeddings that drive algorithms by name (a binding layer, a registry)
//! talk to this trait; Rust callers can equally use the typed setters on
//! [`FDep`] and [`FdVerifier`] directly. Options become available in stages:
//! load-time options before [`Algorithm::fit`], execute-time options after,
//! mirroring how the data they need becomes available.

use crate::fdep::FDep;
use crate::input::FdInput;
use crate::table::RelationInput;
use crate::verify::FdVerifier;
use crate::{Error, Result};

/// A dynamically supplied option value.
#[derive(Debug, Clone)]
pub enum OptionValue {
    Bool(bool),
    UInt(u64),
    Fd(FdInput),
}

/// The value variant an option expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Bool,
    UInt,
    Fd,
}

/// How a run ended. Cancellation is a status, not an error: the instance
/// stays fitted and can be executed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Completed { elapsed_ms: u64 },
    Cancelled,
}

/// The capability set every algorithm exposes.
pub trait Algorithm {
    /// Set a configuration option by name.
    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()>;

    /// The options that can usefully be set in the current stage.
    fn needed_options(&self) -> Vec<&'static str>;

    /// The expected value type of an option, or `None` if unrecognized.
    fn option_type(&self, name: &str) -> Option<OptionType>;

    /// Load a table. Clears previous results; on failure the instance can be
    /// fitted again.
    fn fit(&mut self, input: &mut dyn RelationInput) -> Result<()>;

    /// Run the algorithm, returning the elapsed time in milliseconds or the
    /// cancelled status.
    fn execute(&mut self) -> Result<Execution>;
}

impl Algorithm for FDep {
    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()> {
        match name {
            "equal_nulls" => match value {
                OptionValue::Bool(flag) => {
                    self.set_equal_nulls(flag);
                    Ok(())
                }
                _ => Err(Error::OptionTypeMismatch {
                    option: "equal_nulls",
                    expected: OptionType::Bool,
                }),
            },
            "max_lhs" => {
                if !self.is_fitted() {
                    return Err(Error::NotFitted);
                }
                match value {
                    OptionValue::UInt(max_lhs) => {
                        self.set_max_lhs(usize::try_from(max_lhs).unwrap_or(usize::MAX));
                        Ok(())
                    }
                    _ => Err(Error::OptionTypeMismatch {
                        option: "max_lhs",
                        expected: OptionType::UInt,
                    }),
                }
            }
            _ => Err(Error::UnknownOption(name.to_string())),
        }
    }

    fn needed_options(&self) -> Vec<&'static str> {
        if self.is_fitted() {
            vec!["max_lhs"]
        } else {
            vec!["equal_nulls"]
        }
    }

    fn option_type(&self, name: &str) -> Option<OptionType> {
        match name {
            "equal_nulls" => Some(OptionType::Bool),
            "max_lhs" => Some(OptionType::UInt),
            _ => None,
        }
    }

    fn fit(&mut self, input: &mut dyn RelationInput) -> Result<()> {
        FDep::fit(self, input)
    }

    fn execute(&mut self) -> Result<Execution> {
        FDep::execute(self)
    }
}

impl Algorithm for FdVerifier {
    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()> {
        match name {
            "equal_nulls" => match value {
                OptionValue::Bool(flag) => {
                    self.set_equal_nulls(flag);
                    Ok(())
                }
                _ => Err(Error::OptionTypeMismatch {
                    option: "equal_nulls",
                    expected: OptionType::Bool,
                }),
            },
            "fd" => match value {
                OptionValue::Fd(fd) => self.set_fd(&fd),
                _ => Err(Error::OptionTypeMismatch {
                    option: "fd",
                    expected: OptionType::Fd,
                }),
            },
            _ => Err(Error::UnknownOption(name.to_string())),
        }
    }

    fn needed_options(&self) -> Vec<&'static str> {
        if self.is_fitted() {
            vec!["fd"]
        } else {
            vec!["equal_nulls"]
        }
    }

    fn option_type(&self, name: &str) -> Option<OptionType> {
        match name {
            "equal_nulls" => Some(OptionType::Bool),
            "fd" => Some(OptionType::Fd),
            _ => None,
        }
    }

    fn fit(&mut self, input: &mut dyn RelationInput) -> Result<()> {
        FdVerifier::fit(self, input)
    }

    fn execute(&mut self) -> Result<Execution> {
        FdVerifier::execute(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MemoryRelation;

    fn table() -> MemoryRelation {
        MemoryRelation::of("t", &["K", "V"], &[&["a", "1"], &["b", "2"], &["c", "3"]])
    }

    #[test]
    fn options_become_available_in_stages() {
        let mut miner = FDep::new();
        assert_eq!(miner.needed_options(), vec!["equal_nulls"]);
        assert!(matches!(
            miner.set_option("max_lhs", OptionValue::UInt(2)),
            Err(Error::NotFitted)
        ));

        Algorithm::fit(&mut miner, &mut table()).unwrap();
        assert_eq!(miner.needed_options(), vec!["max_lhs"]);
        miner.set_option("max_lhs", OptionValue::UInt(2)).unwrap();
        assert!(matches!(
            Algorithm::execute(&mut miner).unwrap(),
            Execution::Completed { .. }
        ));
    }

    #[test]
    fn option_misuse_is_reported() {
        let mut miner = FDep::new();
        assert!(matches!(
            miner.set_option("equal_nulls", OptionValue::UInt(1)),
            Err(Error::OptionTypeMismatch { option: "equal_nulls", .. })
        ));
        assert!(matches!(
            miner.set_option("mystery", OptionValue::Bool(true)),
            Err(Error::UnknownOption(_))
        ));
        assert_eq!(miner.option_type("max_lhs"), Some(OptionType::UInt));
        assert_eq!(miner.option_type("mystery"), None);
    }

    #[test]
    fn verifier_through_the_dynamic_surface() {
        let mut verifier = FdVerifier::new();
        verifier
            .set_option("equal_nulls", OptionValue::Bool(false))
            .unwrap();
        assert!(matches!(
            verifier.set_option("fd", OptionValue::Fd(FdInput::new(["K"], ["V"]))),
            Err(Error::NotFitted)
        ));

        Algorithm::fit(&mut verifier, &mut table()).unwrap();
        verifier
            .set_option("fd", OptionValue::Fd(FdInput::new(["K"], ["V"])))
            .unwrap();
        Algorithm::execute(&mut verifier).unwrap();
        assert!(verifier.fd_holds().unwrap());
    }
}
