use serde::{Deserialize, Serialize};

/// A named ledger operation with its ordered string arguments.
///
/// This is the only shape the sequencer hands to the ledger. Arguments are
/// always strings; each operation parses and validates its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, A>(function: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_empty() {
        let inv: Invocation = serde_json::from_str(r#"{"function":"InitLedger"}"#).unwrap();
        assert_eq!(inv, Invocation::new("InitLedger", Vec::<String>::new()));
    }

    #[test]
    fn builds_from_str_slices() {
        let inv = Invocation::new("AddVote", ["p1c1"]);
        assert_eq!(inv.args, vec!["p1c1".to_string()]);
    }
}
