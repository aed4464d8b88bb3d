use sea_orm::TransactionTrait;

use crate::{EntryFilter, OperationView, Page, ResultEngine, aggregate_operations, aggregate_page};

use super::{Engine, with_tx};

impl Engine {
    /// Operations of `owner_id` whose entries match `filter`, newest first.
    pub async fn list_operations(
        &self,
        owner_id: &str,
        filter: &EntryFilter,
    ) -> ResultEngine<Vec<OperationView>> {
        filter.validate()?;
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            let found = self.find_filtered(&db_tx, owner_id, filter).await?;
            let names = self.account_names(&db_tx, owner_id).await?;
            Ok(aggregate_operations(found, &names))
        })
    }

    /// Groups one zero-based page of matching entries into operations.
    ///
    /// `total` on the returned page counts entries, not operations. An
    /// operation whose entries fall on two pages appears partially on both.
    pub async fn list_operations_page(
        &self,
        owner_id: &str,
        filter: &EntryFilter,
        page: u64,
        per_page: u64,
    ) -> ResultEngine<Page<OperationView>> {
        filter.validate()?;
        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;
            let (found, total) = self
                .find_filtered_page(&db_tx, owner_id, filter, page, per_page)
                .await?;
            let names = self.account_names(&db_tx, owner_id).await?;
            Ok(aggregate_page(found, &names, page, per_page, total))
        })
    }
}
