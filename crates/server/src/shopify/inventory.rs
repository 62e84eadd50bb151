//! Inventory level lookup against the Admin GraphQL API.
//!
//! One fixed query per request, so the raw-query + serde-typed-response
//! idiom is used here rather than generated query types. The raw upstream
//! payload is kept alongside the parsed nodes for diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{instrument, warn};

/// Quantity name extracted from each inventory level.
const AVAILABLE: &str = "available";

const VARIANT_INVENTORY_QUERY: &str = r#"
query VariantInventoryLevels($id: ID!) {
  productVariant(id: $id) {
    id
    title
    inventoryItem {
      inventoryLevels(first: 10) {
        nodes {
          location {
            id
            name
          }
          quantities(names: ["available"]) {
            name
            quantity
          }
        }
      }
    }
  }
}
"#;

/// Inventory query failure (transport or parse), captured verbatim.
#[derive(Debug, Error)]
#[error("inventory query failed: {detail}")]
pub struct QueryFailure {
    pub detail: Value,
}

/// A location attached to an inventory level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNode {
    pub id: String,
    pub name: String,
}

/// One named quantity on an inventory level.
#[derive(Debug, Clone, Deserialize)]
pub struct QuantityEntry {
    pub name: String,
    pub quantity: i64,
}

/// One inventory level node as returned by the Admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryLevelNode {
    pub location: LocationNode,
    #[serde(default)]
    pub quantities: Vec<QuantityEntry>,
}

/// Parsed inventory levels plus the raw upstream payload.
#[derive(Debug)]
pub struct InventoryLevels {
    pub nodes: Vec<InventoryLevelNode>,
    pub raw: Value,
}

/// The inventory level whose location matched the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryMatch {
    pub location: LocationNode,
    /// The "available" quantity; `None` if the level carried no such entry.
    pub quantity: Option<i64>,
}

/// Qualify a bare numeric variant ID as a Shopify GID; qualified IDs pass
/// through unchanged.
#[must_use]
pub fn variant_gid(id: &str) -> String {
    qualify(id, "ProductVariant")
}

/// Qualify a bare numeric location ID as a Shopify GID; qualified IDs pass
/// through unchanged.
#[must_use]
pub fn location_gid(id: &str) -> String {
    qualify(id, "Location")
}

fn qualify(id: &str, resource: &str) -> String {
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("gid://shopify/{resource}/{id}")
    }
}

/// Pick the inventory level matching the requested location.
///
/// Nodes are scanned in upstream order; the first whose location ID equals
/// the normalized requested location, or whose location name equals the raw
/// requested identifier, wins. No match is a valid outcome.
#[must_use]
pub fn select_match(
    nodes: Vec<InventoryLevelNode>,
    requested_location: &str,
) -> Option<InventoryMatch> {
    let normalized = location_gid(requested_location);

    nodes
        .into_iter()
        .find(|node| node.location.id == normalized || node.location.name == requested_location)
        .map(|node| {
            let quantity = node
                .quantities
                .iter()
                .find(|q| q.name == AVAILABLE)
                .map(|q| q.quantity);
            InventoryMatch {
                location: node.location,
                quantity,
            }
        })
}

/// Fetch inventory levels for a variant (up to 10 locations).
///
/// A payload without the expected node path (e.g., unknown variant, or a
/// GraphQL error response) yields an empty node list, not an error; the raw
/// payload still carries whatever the Admin API said.
///
/// # Errors
///
/// Returns [`QueryFailure`] if the request cannot be sent or the response
/// body is not JSON.
#[instrument(skip(client, access_token), fields(shop = %shop, variant = %variant))]
pub async fn fetch_variant_inventory(
    client: &reqwest::Client,
    shop: &str,
    api_version: &str,
    access_token: &str,
    variant: &str,
) -> Result<InventoryLevels, QueryFailure> {
    let endpoint = format!("https://{shop}/admin/api/{api_version}/graphql.json");

    let body = serde_json::json!({
        "query": VARIANT_INVENTORY_QUERY,
        "variables": { "id": variant },
    });

    let response = client
        .post(&endpoint)
        .header("X-Shopify-Access-Token", access_token)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "inventory query request failed");
            QueryFailure {
                detail: Value::String(e.to_string()),
            }
        })?;

    let text = response.text().await.map_err(|e| QueryFailure {
        detail: Value::String(e.to_string()),
    })?;

    let raw: Value = serde_json::from_str(&text).map_err(|e| {
        warn!(error = %e, "inventory query returned non-JSON body");
        QueryFailure {
            detail: Value::String(format!("invalid JSON from Admin API: {e}")),
        }
    })?;

    let nodes = parse_nodes(&raw);

    Ok(InventoryLevels { nodes, raw })
}

fn parse_nodes(raw: &Value) -> Vec<InventoryLevelNode> {
    raw.pointer("/data/productVariant/inventoryItem/inventoryLevels/nodes")
        .cloned()
        .and_then(|nodes| serde_json::from_value(nodes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, quantities: Vec<(&str, i64)>) -> InventoryLevelNode {
        InventoryLevelNode {
            location: LocationNode {
                id: id.to_string(),
                name: name.to_string(),
            },
            quantities: quantities
                .into_iter()
                .map(|(name, quantity)| QuantityEntry {
                    name: name.to_string(),
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_variant_gid_qualifies_bare_id() {
        assert_eq!(variant_gid("42"), "gid://shopify/ProductVariant/42");
    }

    #[test]
    fn test_variant_gid_passes_qualified_id_through() {
        assert_eq!(
            variant_gid("gid://shopify/ProductVariant/42"),
            "gid://shopify/ProductVariant/42"
        );
    }

    #[test]
    fn test_location_gid_qualifies_bare_id() {
        assert_eq!(location_gid("7"), "gid://shopify/Location/7");
    }

    #[test]
    fn test_select_match_by_normalized_id() {
        let nodes = vec![
            node("gid://shopify/Location/1", "Warehouse", vec![]),
            node(
                "gid://shopify/Location/7",
                "Store",
                vec![("available", 5), ("on_hand", 9)],
            ),
        ];

        let m = select_match(nodes, "7").unwrap();
        assert_eq!(m.location.name, "Store");
        assert_eq!(m.quantity, Some(5));
    }

    #[test]
    fn test_select_match_by_location_name() {
        let nodes = vec![node(
            "gid://shopify/Location/7",
            "Front of house",
            vec![("available", 3)],
        )];

        let m = select_match(nodes, "Front of house").unwrap();
        assert_eq!(m.location.id, "gid://shopify/Location/7");
        assert_eq!(m.quantity, Some(3));
    }

    #[test]
    fn test_select_match_first_match_wins() {
        let nodes = vec![
            node("gid://shopify/Location/7", "First", vec![("available", 1)]),
            node("gid://shopify/Location/7", "Second", vec![("available", 2)]),
        ];

        let m = select_match(nodes, "7").unwrap();
        assert_eq!(m.location.name, "First");
    }

    #[test]
    fn test_select_match_no_available_entry_yields_null_quantity() {
        let nodes = vec![node(
            "gid://shopify/Location/7",
            "Store",
            vec![("on_hand", 9)],
        )];

        let m = select_match(nodes, "7").unwrap();
        assert_eq!(m.quantity, None);
    }

    #[test]
    fn test_select_match_absent_location() {
        let nodes = vec![node("gid://shopify/Location/1", "Other", vec![])];

        assert!(select_match(nodes, "7").is_none());
    }

    #[test]
    fn test_parse_nodes_happy_path() {
        let raw = serde_json::json!({
            "data": {
                "productVariant": {
                    "id": "gid://shopify/ProductVariant/42",
                    "title": "Default",
                    "inventoryItem": {
                        "inventoryLevels": {
                            "nodes": [{
                                "location": {"id": "gid://shopify/Location/7", "name": "Store"},
                                "quantities": [{"name": "available", "quantity": 0}]
                            }]
                        }
                    }
                }
            }
        });

        let nodes = parse_nodes(&raw);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.first().unwrap().location.name, "Store");
    }

    #[test]
    fn test_parse_nodes_missing_variant_is_empty() {
        let raw = serde_json::json!({"data": {"productVariant": null}});
        assert!(parse_nodes(&raw).is_empty());
    }

    #[test]
    fn test_parse_nodes_graphql_error_payload_is_empty() {
        let raw = serde_json::json!({"errors": [{"message": "Invalid ID"}]});
        assert!(parse_nodes(&raw).is_empty());
    }
}
