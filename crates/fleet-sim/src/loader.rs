//! CSV node loader.
//!
//! # CSV format
//!
//! One row per node.  `amount` is the customer's demand or the depot's
//! stock; it becomes the upper bound and the initial value, with a lower
//! bound of zero.  Leave it empty for a customer without tracked demand or
//! a depot with unlimited stock.
//!
//! ```csv
//! kind,x,y,amount
//! depot,0,0,500
//! customer,5,3,4
//! customer,9,1,2
//! depot,12,12,
//! ```
//!
//! Rows keep their file order within each group, so the first `customer`
//! row becomes `CustomerId(0)`.

use std::io::Read;
use std::path::Path;

use fleet_core::{BoundSide, Coord, RestrictionSpec};
use serde::Deserialize;

use crate::{CustomerConfig, DepotConfig, SimError, SimResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    kind:   String,
    x:      i32,
    y:      i32,
    amount: Option<f64>,
}

/// Customers and depots read from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSet {
    pub customers: Vec<CustomerConfig>,
    pub depots:    Vec<DepotConfig>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load customers and depots from a CSV file.
pub fn load_nodes_csv(path: &Path) -> SimResult<NodeSet> {
    let file = std::fs::File::open(path)?;
    load_nodes_reader(file)
}

/// Like [`load_nodes_csv`] but accepts any `Read` source.
pub fn load_nodes_reader<R: Read>(reader: R) -> SimResult<NodeSet> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut nodes = NodeSet::default();

    for (line, result) in csv_reader.deserialize::<NodeRecord>().enumerate() {
        let row = result.map_err(|e| SimError::Parse(e.to_string()))?;
        let at = Coord::new(row.x, row.y);
        let spec = row.amount.map(amount_spec).transpose().map_err(|msg| {
            SimError::Parse(format!("row {}: {msg}", line + 1))
        })?;

        match row.kind.trim() {
            "customer" => nodes.customers.push(CustomerConfig { at, demand: spec }),
            "depot"    => nodes.depots.push(DepotConfig { at, stock: spec }),
            other => {
                return Err(SimError::Parse(format!(
                    "row {}: invalid kind {other:?}: expected \"customer\" or \"depot\"",
                    line + 1
                )));
            }
        }
    }

    Ok(nodes)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn amount_spec(amount: f64) -> Result<RestrictionSpec, String> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount {amount} must be a non-negative number"));
    }
    Ok(RestrictionSpec::bounded(0.0, amount, BoundSide::Max))
}
