//! Order Analytics - Query Persistence Example
//!
//! Parses a handful of queries over nested order documents and prints
//! each one in both wire protocol versions, then reads the current form
//! back to show it survives unchanged.
//!
//! Run with: cargo run --example orders

use oxide_ionql_core::{deserialize, parse_statement, serialize_with_version, AstVersion};

// =============================================================================
// QUERIES
// =============================================================================

const QUERIES: &[(&str, &str)] = &[
    (
        "Open orders with their line items",
        "SELECT o.id, i.sku, i.qty FROM orders AS o, o.items AS i WHERE o.status = 'open'",
    ),
    (
        "Revenue per customer",
        "SELECT c, SUM(o.total) AS revenue FROM orders AS o GROUP BY o.customer AS c",
    ),
    (
        "Orders shipped outside the usual regions",
        "SELECT VALUE o FROM orders AS o WHERE o.ship.region NOT IN ('eu', 'us')",
    ),
    (
        "Attribute names of one order",
        "SELECT n FROM UNPIVOT `{sku: \"A1\", qty: 3}` AS v AT n",
    ),
    (
        "Close an order",
        "UPDATE orders AS o SET o.status = 'closed' WHERE o.id = ?",
    ),
];

fn show(description: &str, sql: &str) {
    println!(";; {description}");
    println!(";; {sql}");
    let expr = match parse_statement(sql) {
        Ok(expr) => expr,
        Err(e) => {
            println!(";; error: {e}");
            println!();
            return;
        }
    };
    for version in [AstVersion::V0, AstVersion::V1] {
        let wire = serialize_with_version(&expr, version);
        println!(";; {version}");
        println!("{}", wire.to_pretty_string());
    }
    let back = serialize_with_version(&expr, AstVersion::CURRENT);
    match deserialize(&back) {
        Ok(read) if read == expr => println!(";; round trip ok"),
        Ok(_) => println!(";; round trip changed the tree"),
        Err(e) => println!(";; round trip failed: {e}"),
    }
    println!();
}

fn main() {
    for (description, sql) in QUERIES {
        show(description, sql);
    }
}
