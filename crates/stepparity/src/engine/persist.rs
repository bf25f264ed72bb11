//! Persisted payloads: the flat parity result and the annotation bundle.
//!
//! Parity result: `[[u8]]`, outer index row, inner index column, value the `Foot`
//! ordinal. Parsing checks the shape against the chart before anything is mutated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ParityError, Result};
use crate::foot::Foot;
use crate::graph::NodeId;

pub fn serialize_parity_data(parities: &[Vec<Foot>], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(parities)?
    } else {
        serde_json::to_string(parities)?
    };
    Ok(json)
}

/// Parse a parity result and check it has `row_count` rows of `column_count` columns.
pub fn parse_parity_data(json: &str, row_count: usize, column_count: usize) -> Result<Vec<Vec<Foot>>> {
    let parities: Vec<Vec<Foot>> = serde_json::from_str(json)?;
    if parities.len() != row_count {
        return Err(ParityError::RowCountMismatch {
            expected: row_count,
            found: parities.len(),
        });
    }
    if let Some((row, feet)) = parities.iter().enumerate().find(|(_, f)| f.len() != column_count) {
        return Err(ParityError::ColumnCountMismatch {
            row,
            expected: column_count,
            found: feet.len(),
        });
    }
    Ok(parities)
}

/// External save of one annotated chart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    /// Cheapest path, one node per row.
    pub selected_nodes: Vec<NodeId>,
    /// Row index → per-column override array.
    pub overrides: BTreeMap<usize, Vec<Foot>>,
    pub parities: Vec<Vec<Foot>>,
}

impl AnnotationPayload {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_json_is_ordinals() {
        let p = vec![vec![Foot::LeftHeel, Foot::None], vec![Foot::RightToe, Foot::RightHeel]];
        let json = serialize_parity_data(&p, false).unwrap();
        assert_eq!(json, "[[1,0],[4,3]]");
        assert_eq!(parse_parity_data(&json, 2, 2).unwrap(), p);
    }

    #[test]
    fn bad_shapes_and_ordinals_are_rejected() {
        assert!(matches!(
            parse_parity_data("[[1,0]]", 2, 2),
            Err(ParityError::RowCountMismatch { expected: 2, found: 1 })
        ));
        assert!(matches!(
            parse_parity_data("[[1,0],[1]]", 2, 2),
            Err(ParityError::ColumnCountMismatch { row: 1, .. })
        ));
        assert!(matches!(
            parse_parity_data("[[7,0]]", 1, 2),
            Err(ParityError::MalformedPayload(_))
        ));
        assert!(parse_parity_data("not json", 1, 2).is_err());
    }

    #[test]
    fn annotation_payload_keys_rows_by_index() {
        let mut overrides = BTreeMap::new();
        overrides.insert(3, vec![Foot::None, Foot::LeftHeel]);
        let payload = AnnotationPayload {
            selected_nodes: vec![NodeId(1), NodeId(4)],
            overrides,
            parities: vec![vec![Foot::LeftHeel, Foot::None]],
        };
        let json = payload.to_json().unwrap();
        assert!(json.contains(r#""overrides":{"3":[0,1]}"#));
        assert!(json.contains(r#""selected_nodes":[1,4]"#));
        assert_eq!(AnnotationPayload::from_json(&json).unwrap(), payload);
    }
}
