use crate::client::{PosClient, PosError};

/// A store as listed by `GET /stores`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub id: String,
    pub name: String,
}

impl PosClient {
    /// List live stores. Entries without an id or with `deleted_at` set are dropped.
    pub fn list_stores(&self) -> Result<Vec<Store>, PosError> {
        let body = self.get_json("stores", &[])?;
        let items = body["stores"]
            .as_array()
            .ok_or_else(|| PosError::Parse("stores response missing 'stores' array".into()))?;

        let stores = items
            .iter()
            .filter(|s| s["deleted_at"].is_null())
            .filter_map(|s| {
                Some(Store {
                    id: s["id"].as_str()?.to_string(),
                    name: s["name"].as_str().unwrap_or("").to_string(),
                })
            })
            .collect();

        Ok(stores)
    }

    /// Store id for a tenant name. Exactly one store must match.
    pub fn resolve_store_id(&self, name: &str) -> Result<String, PosError> {
        let stores = self.list_stores()?;
        let id = match_store(&stores, name)?;
        tracing::debug!(store = name, store_id = %id, "store resolved");
        Ok(id)
    }
}

/// Exact, case-sensitive name match. Zero or several matches is an error.
pub fn match_store(stores: &[Store], name: &str) -> Result<String, PosError> {
    let matches: Vec<&Store> = stores.iter().filter(|s| s.name == name).collect();
    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(PosError::StoreNotFound(name.to_string())),
        many => Err(PosError::StoreAmbiguous {
            name: name.to_string(),
            matches: many.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiConfig;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn store(id: &str, name: &str) -> Store {
        Store { id: id.into(), name: name.into() }
    }

    fn client(server: &MockServer) -> PosClient {
        let mut config = ApiConfig::new("tok_test").with_api_base(server.base_url());
        config.max_retries = 0;
        config.backoff = Duration::ZERO;
        PosClient::new(config)
    }

    #[test]
    fn test_match_single() {
        let stores = vec![store("s1", "Store A"), store("s2", "Store B")];
        assert_eq!(match_store(&stores, "Store B").unwrap(), "s2");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let stores = vec![store("s1", "Store A")];
        let err = match_store(&stores, "store a").unwrap_err();
        assert!(matches!(err, PosError::StoreNotFound(ref n) if n == "store a"));
    }

    #[test]
    fn test_match_ambiguous() {
        let stores = vec![store("s1", "Store A"), store("s2", "Store A")];
        let err = match_store(&stores, "Store A").unwrap_err();
        assert!(matches!(err, PosError::StoreAmbiguous { matches: 2, .. }));
    }

    #[test]
    fn test_resolve_skips_deleted_stores() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/stores");
            then.status(200).json_body(serde_json::json!({
                "stores": [
                    {"id": "old", "name": "Store A", "deleted_at": "2023-05-01T00:00:00.000Z"},
                    {"id": "new", "name": "Store A", "deleted_at": null},
                    {"name": "Store A"},
                    {"id": "s9", "name": "Store Z"}
                ]
            }));
        });

        let id = client(&server).resolve_store_id("Store A").unwrap();
        mock.assert();
        assert_eq!(id, "new");
    }

    #[test]
    fn test_resolve_missing_array() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/stores");
            then.status(200).json_body(serde_json::json!({"items": []}));
        });

        let err = client(&server).resolve_store_id("Store A").unwrap_err();
        assert!(matches!(err, PosError::Parse(_)), "{err:?}");
    }
}
