//! JSON documents describing a network.
//!
//! ```json
//! {
//!   "variables": [
//!     { "name": "A", "states": 2, "cpt": [[0.5, 0.5]] },
//!     { "name": "B", "states": 2, "parents": ["A"],
//!       "cpt": [[0.9, 0.1], [0.1, 0.9]] }
//!   ]
//! }
//! ```
//!
//! `cpt` has one row per parent configuration, encoded row-major over
//! `parents` in the order listed. Variables may appear in any order.

use crate::error::ProbError;
use crate::kernel::Kernel;
use crate::network::BayesNet;
use serde::{Deserialize, Serialize};

/// A serializable description of a whole network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub variables: Vec<VariableDocument>,
}

/// One variable with its conditional probability table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDocument {
    pub name: String,
    pub states: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    pub cpt: Vec<Vec<f64>>,
}

impl NetworkDocument {
    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, ProbError> {
        serde_json::from_str(json).map_err(|e| ProbError::Parse(e.to_string()))
    }

    /// Serialize the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ProbError> {
        serde_json::to_string_pretty(self).map_err(|e| ProbError::Parse(e.to_string()))
    }

    /// Build the network: declare every variable, then attach the CPDs.
    pub fn build(&self) -> Result<BayesNet, ProbError> {
        let mut net = BayesNet::new();
        for var in &self.variables {
            net.add_variable(&var.name, var.states)?;
        }

        for var in &self.variables {
            let child = net.variable(&var.name)?;
            let parents = var
                .parents
                .iter()
                .map(|p| net.variable(p))
                .collect::<Result<Vec<_>, _>>()?;
            net.add_conditional(child, parents, Kernel::new(var.cpt.clone())?)?;
        }

        Ok(net)
    }
}

impl BayesNet {
    /// Load a network from a JSON [`NetworkDocument`].
    pub fn from_json(json: &str) -> Result<BayesNet, ProbError> {
        NetworkDocument::from_json(json)?.build()
    }

    /// Describe this network as a document. Fails if a CPD is missing.
    pub fn to_document(&self) -> Result<NetworkDocument, ProbError> {
        let variables = (0..self.n_vars())
            .map(|var| {
                let cpd = self.cpd(var)?;
                Ok(VariableDocument {
                    name: self.names()[var].clone(),
                    states: cpd.n_states,
                    parents: cpd
                        .parents
                        .iter()
                        .map(|&p| self.names()[p].clone())
                        .collect(),
                    cpt: cpd.cpt.k.clone(),
                })
            })
            .collect::<Result<Vec<_>, ProbError>>()?;
        Ok(NetworkDocument { variables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::sprinkler_network;

    const CHAIN: &str = r#"{
        "variables": [
            { "name": "B", "states": 2, "parents": ["A"], "cpt": [[0.9, 0.1], [0.1, 0.9]] },
            { "name": "A", "states": 2, "cpt": [[0.5, 0.5]] }
        ]
    }"#;

    #[test]
    fn test_load_out_of_order() {
        let net = BayesNet::from_json(CHAIN).unwrap();
        assert_eq!(net.n_vars(), 2);
        assert_eq!(net.names(), &["B".to_string(), "A".to_string()]);
        assert!(net.is_parent(1, 0));
        assert!(net.validate().is_ok());
    }

    #[test]
    fn test_unknown_parent() {
        let json = r#"{ "variables": [
            { "name": "B", "states": 2, "parents": ["Z"], "cpt": [[0.5, 0.5], [0.5, 0.5]] }
        ] }"#;
        assert_eq!(
            BayesNet::from_json(json).unwrap_err(),
            ProbError::UnknownVariable("Z".into())
        );
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            BayesNet::from_json("{ \"variables\": 3 }"),
            Err(ProbError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_cpt_rejected() {
        let json = r#"{ "variables": [
            { "name": "A", "states": 2, "cpt": [[0.5, 0.6]] }
        ] }"#;
        assert!(matches!(
            BayesNet::from_json(json),
            Err(ProbError::RowNotNormalized { .. })
        ));
    }

    #[test]
    fn test_document_round_trip() {
        let net = sprinkler_network();
        let json = net.to_document().unwrap().to_json().unwrap();
        let reloaded = BayesNet::from_json(&json).unwrap();
        assert_eq!(reloaded.names(), net.names());
        assert_eq!(reloaded.edges(), net.edges());
        assert_eq!(reloaded.cpd(3).unwrap(), net.cpd(3).unwrap());
    }
}
