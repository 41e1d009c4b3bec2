use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::builder::{BuilderParams, ResourceBuilder};
use crate::cache::CacheError;
use crate::domain::tables::{LanguageRecord, LanguageTable};
use crate::domain::ResourceName;
use crate::infra::db::Store;

/// Builds the installed-language list. Unscoped: languages are global to
/// the installation.
pub struct LanguageListBuilder {
    store: Arc<dyn Store>,
}

impl LanguageListBuilder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceBuilder for LanguageListBuilder {
    async fn build(
        &self,
        resource: &ResourceName,
        _params: &BuilderParams,
    ) -> Result<Value, CacheError> {
        let rows = self.store.language_rows().await?;
        let table = LanguageTable {
            languages: rows
                .into_iter()
                .map(|row| LanguageRecord {
                    language_id: row.language_id,
                    language_code: row.language_code,
                    country_code: row.country_code,
                    is_default: row.is_default,
                })
                .collect(),
        };
        serde_json::to_value(&table).map_err(|err| CacheError::Serialize {
            resource: resource.to_string(),
            source: err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::db::{LanguageRow, MemoryStore};

    #[tokio::test]
    async fn language_rows_map_to_the_lookup_table() {
        let mut store = MemoryStore::new();
        store.add_language(LanguageRow {
            language_id: 1,
            language_code: "en".to_string(),
            country_code: "us".to_string(),
            is_default: true,
        });
        store.add_language(LanguageRow {
            language_id: 2,
            language_code: "de".to_string(),
            country_code: "de".to_string(),
            is_default: false,
        });

        let builder = LanguageListBuilder::new(Arc::new(store));
        let resource = ResourceName::parse("languages").unwrap();
        let value = builder.build(&resource, &Vec::new()).await.unwrap();
        let table: LanguageTable = serde_json::from_value(value).unwrap();

        assert_eq!(table.default_language().unwrap().language_code, "en");
        assert_eq!(table.by_code("de").unwrap().language_id, 2);
    }
}
